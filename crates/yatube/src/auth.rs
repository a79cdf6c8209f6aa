//! Passwords, sessions and the request viewer.
use argon2::{Algorithm, Argon2, Params, Version};
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use salvo::http::uri::Uri;
use salvo::prelude::*;
use salvo::session::SessionDepotExt;
use yatube_core::{User, UserId};

use crate::state::AppState;
use crate::{AppError, AppResult};

/// Session key holding the id of the logged in user.
pub const SESSION_USER_KEY: &str = "user_id";
const VIEWER_KEY: &str = "yatube.viewer";

/// Argon2 password hashing with configurable cost.
#[derive(Clone, Debug)]
pub struct Passwords {
    params: Params,
}
impl Passwords {
    /// Create a new `Passwords` with the given memory cost (KiB) and iteration count.
    pub fn new(memory_kib: u32, iterations: u32) -> AppResult<Self> {
        let params = Params::new(memory_kib, iterations, 1, None)
            .map_err(|e| AppError::PasswordHash(e.to_string()))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hashes a plaintext password into a PHC string.
    pub fn hash(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Ok(self
            .argon2()
            .hash_password(password.as_bytes(), &salt)?
            .to_string())
    }

    /// Checks a plaintext password against a PHC string.
    #[must_use]
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        PasswordHash::new(hash).is_ok_and(|parsed| {
            self.argon2()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
    }
}

/// Access to the viewer resolved by [`load_viewer`].
pub trait DepotViewerExt {
    /// The logged in user, `None` for guests.
    fn viewer(&self) -> Option<&User>;
}
impl DepotViewerExt for Depot {
    fn viewer(&self) -> Option<&User> {
        self.get::<User>(VIEWER_KEY).ok()
    }
}

/// Resolves the session user into the depot.
///
/// A session pointing at a user that no longer exists is cleared.
#[handler]
pub async fn load_viewer(depot: &mut Depot) {
    let Some(id) = depot
        .session()
        .and_then(|session| session.get::<u64>(SESSION_USER_KEY))
    else {
        return;
    };
    let Ok(state) = depot.obtain::<AppState>().cloned() else {
        return;
    };
    match state.store.user(UserId(id)).await {
        Ok(user) => {
            depot.insert(VIEWER_KEY, user);
        }
        Err(e) => {
            tracing::debug!(user = id, error = %e, "stale session user");
            if let Some(session) = depot.session_mut() {
                session.remove(SESSION_USER_KEY);
            }
        }
    }
}

/// Redirects guests to the login page, remembering where they were going.
#[handler]
pub async fn require_login(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    if depot.viewer().is_some() {
        return;
    }
    let next = req
        .uri()
        .path_and_query()
        .map_or_else(|| req.uri().path().to_owned(), |pq| pq.as_str().to_owned());
    match login_redirect(&next) {
        Ok(redirect) => res.render(redirect),
        Err(e) => {
            tracing::error!(error = %e, "cannot build login redirect");
            res.render(StatusError::internal_server_error());
        }
    }
    ctrl.skip_rest();
}

/// A `302` to the login page carrying `next`.
pub fn login_redirect(next: &str) -> AppResult<Redirect> {
    let next: String = form_urlencoded::byte_serialize(next.as_bytes()).collect();
    Ok(Redirect::with_status_code(
        StatusCode::FOUND,
        format!("/auth/login/?next={next}"),
    )?)
}

/// Whether `next` is a path on this site that can be used as a redirect
/// target, so following it cannot leave the site.
#[must_use]
pub fn is_local_path(next: &str) -> bool {
    next.starts_with('/')
        && !next.starts_with("//")
        && !next.contains('\\')
        && next.parse::<Uri>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let passwords = Passwords::new(64, 1).unwrap();
        let hash = passwords.hash("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(passwords.verify("correct horse", &hash));
        assert!(!passwords.verify("wrong horse", &hash));
        assert!(!passwords.verify("correct horse", "not a hash"));
    }

    #[test]
    fn test_is_local_path() {
        assert!(is_local_path("/alice/"));
        assert!(is_local_path("/alice/?page=2"));
        assert!(!is_local_path("//evil.example/"));
        assert!(!is_local_path("https://evil.example/"));
        assert!(!is_local_path(""));
        assert!(!is_local_path("/a b/"));
    }
}
