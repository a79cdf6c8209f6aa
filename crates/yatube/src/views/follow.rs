//! Follow and unfollow links.
use salvo::prelude::*;

use super::{found, param};
use crate::auth::{DepotViewerExt, is_local_path};
use crate::state::AppState;
use crate::{AppError, AppResult};

/// Where to go after a follow change: a local `next`, or the author's profile.
fn next_location(req: &Request, username: &str) -> String {
    match req.query::<String>("next") {
        Some(next) if is_local_path(&next) => next,
        _ => format!("/{username}/"),
    }
}

/// `GET /<username>/follow/`
#[handler]
pub async fn profile_follow(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> AppResult<()> {
    let state = AppState::from_depot(depot)?;
    let viewer = depot
        .viewer()
        .ok_or_else(|| AppError::from(yatube_core::Error::not_found("viewer")))?;
    let username = param(req, "username")?;
    let outcome = state.follows.follow(viewer, username).await?;
    tracing::debug!(user = %viewer.username, author = username, ?outcome, "follow");
    res.render(found(next_location(req, username))?);
    Ok(())
}

/// `GET /<username>/unfollow/`
#[handler]
pub async fn profile_unfollow(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> AppResult<()> {
    let state = AppState::from_depot(depot)?;
    let viewer = depot
        .viewer()
        .ok_or_else(|| AppError::from(yatube_core::Error::not_found("viewer")))?;
    let username = param(req, "username")?;
    state.follows.unfollow(viewer, username).await?;
    tracing::debug!(user = %viewer.username, author = username, "unfollow");
    res.render(found(next_location(req, username))?);
    Ok(())
}
