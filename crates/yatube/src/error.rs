use salvo::async_trait;
use salvo::prelude::*;

use crate::config::ConfigError;

/// Errors a request or the server start can fail with.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// Raised by the store, a feed or the follow manager.
    #[error(transparent)]
    Core(#[from] yatube_core::Error),
    /// A template failed to render.
    #[error("template: {0}")]
    Template(#[from] askama::Error),
    /// Filesystem failure, usually while storing an upload.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    /// Password hashing failed.
    #[error("password hash: {0}")]
    PasswordHash(String),
    /// Salvo failed, for example on an invalid redirect target.
    #[error("http: {0}")]
    Http(#[from] salvo::Error),
    /// The session is missing or a value could not be stored in it.
    #[error("session: {0}")]
    Session(String),
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A handler ran without the application state in the depot.
    #[error("application state is not injected")]
    MissingState,
}

impl From<password_hash::Error> for AppError {
    fn from(e: password_hash::Error) -> Self {
        Self::PasswordHash(e.to_string())
    }
}

impl AppError {
    /// Whether the error maps to a 404 page.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Core(e) if e.is_not_found())
    }
}

/// Result type which has [`AppError`] as its error type.
pub type AppResult<T> = Result<T, AppError>;

#[async_trait]
impl Writer for AppError {
    async fn write(self, req: &mut Request, _depot: &mut Depot, res: &mut Response) {
        if self.is_not_found() {
            tracing::debug!(path = %req.uri().path(), error = %self, "not found");
            res.render(StatusError::not_found());
        } else {
            tracing::error!(path = %req.uri().path(), error = %self, "request failed");
            res.render(StatusError::internal_server_error());
        }
    }
}
