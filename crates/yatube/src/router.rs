//! Routes and the service around them.
use salvo::affix_state;
use salvo::catcher::Catcher;
use salvo::logging::Logger;
use salvo::prelude::*;
use salvo::serve_static::StaticDir;
use salvo::session::{CookieStore, SessionHandler};

use crate::auth::{load_viewer, require_login};
use crate::state::AppState;
use crate::views::{about, accounts, errors, follow, posts};
use crate::AppResult;

/// All site routes.
///
/// Fixed prefixes are pushed before the `{username}` catch-all so they take
/// precedence over profile urls.
pub fn router(state: &AppState) -> Router {
    Router::new()
        .get(posts::index)
        .push(Router::with_path("group/{slug}").get(posts::group_posts))
        .push(
            Router::with_path("follow")
                .hoop(require_login)
                .get(posts::follow_index),
        )
        .push(
            Router::with_path("new")
                .hoop(require_login)
                .get(posts::new_post_form)
                .post(posts::new_post),
        )
        .push(
            Router::with_path("auth")
                .push(
                    Router::with_path("signup")
                        .get(accounts::signup_form)
                        .post(accounts::signup),
                )
                .push(
                    Router::with_path("login")
                        .get(accounts::login_form)
                        .post(accounts::login),
                )
                .push(Router::with_path("logout").get(accounts::logout)),
        )
        .push(
            Router::with_path("about")
                .push(Router::with_path("author").get(about::author))
                .push(Router::with_path("tech").get(about::tech)),
        )
        .push(
            Router::with_path("media/{**path}")
                .get(StaticDir::new([state.config.media.root.clone()])),
        )
        .push(
            Router::with_path("{username}")
                .get(posts::profile)
                .push(
                    Router::with_path("follow")
                        .hoop(require_login)
                        .get(follow::profile_follow),
                )
                .push(
                    Router::with_path("unfollow")
                        .hoop(require_login)
                        .get(follow::profile_unfollow),
                )
                .push(
                    Router::with_path("{post_id:num}")
                        .get(posts::post_view)
                        .push(
                            Router::with_path("edit")
                                .hoop(require_login)
                                .get(posts::edit_post_form)
                                .post(posts::edit_post),
                        )
                        .push(
                            Router::with_path("comment")
                                .hoop(require_login)
                                .get(posts::comment_redirect)
                                .post(posts::add_comment),
                        ),
                ),
        )
}

/// The service: request logging, sessions, state injection and the viewer
/// wrap every route, and the catcher renders the site error pages.
pub fn service(state: AppState) -> AppResult<Service> {
    let session = SessionHandler::builder(CookieStore::new(), &state.config.session_secret())
        .build()?;
    let router = router(&state);
    Ok(Service::new(router)
        .hoop(Logger::new())
        .hoop(session)
        .hoop(affix_state::inject(state))
        .hoop(load_viewer)
        .catcher(Catcher::default().hoop(errors::error_page)))
}
