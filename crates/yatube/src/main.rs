//! The Yatube web server.
use salvo::prelude::*;
use tracing_subscriber::EnvFilter;
use yatube::{AppResult, AppState, Config, router};

#[tokio::main]
async fn main() -> AppResult<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    let listen = config.server.listen.clone();
    let state = AppState::new(config)?;
    state.seed_groups().await?;

    let service = router::service(state)?;
    tracing::info!(%listen, "yatube started");
    let acceptor = TcpListener::new(listen).bind().await;
    Server::new(acceptor).serve(service).await;
    Ok(())
}
