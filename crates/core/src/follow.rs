//! Follow edges between users.
use std::sync::Arc;

use crate::{Error, Follow, Result, Store, User};

/// What a [`FollowManager::follow`] call did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FollowOutcome {
    /// A new edge was created.
    Created,
    /// The edge already existed.
    AlreadyFollowing,
    /// The viewer tried to follow themselves; nothing was stored.
    SelfFollow,
}

/// Creates, removes and checks follow edges.
#[derive(Clone)]
pub struct FollowManager {
    store: Arc<dyn Store>,
}
impl std::fmt::Debug for FollowManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FollowManager").finish_non_exhaustive()
    }
}

impl FollowManager {
    /// Create a new `FollowManager`.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Makes `viewer` follow the user named `username`.
    ///
    /// Following oneself and following twice are no-ops.
    pub async fn follow(&self, viewer: &User, username: &str) -> Result<FollowOutcome> {
        let author = self.store.user_by_username(username).await?;
        if author.id == viewer.id {
            tracing::debug!(user = %viewer.username, "self follow ignored");
            return Ok(FollowOutcome::SelfFollow);
        }
        let edge = Follow {
            user: viewer.id,
            author: author.id,
        };
        if self.store.insert_follow(edge).await? {
            tracing::info!(user = %viewer.username, author = %author.username, "follow created");
            Ok(FollowOutcome::Created)
        } else {
            tracing::debug!(
                user = %viewer.username,
                author = %author.username,
                "already following"
            );
            Ok(FollowOutcome::AlreadyFollowing)
        }
    }

    /// Removes the edge from `viewer` to the user named `username`.
    ///
    /// Fails with `NotFound` when the user or the edge does not exist.
    pub async fn unfollow(&self, viewer: &User, username: &str) -> Result<()> {
        let author = self.store.user_by_username(username).await?;
        let edge = Follow {
            user: viewer.id,
            author: author.id,
        };
        if !self.store.delete_follow(edge).await? {
            return Err(Error::not_found(format!(
                "follow from {} to {}",
                viewer.username, author.username
            )));
        }
        tracing::info!(user = %viewer.username, author = %author.username, "follow removed");
        Ok(())
    }

    /// Whether `viewer` follows `author`. Anonymous viewers follow nobody.
    pub async fn is_following(&self, viewer: Option<&User>, author: &User) -> Result<bool> {
        match viewer {
            Some(viewer) => {
                self.store
                    .follow_exists(Follow {
                        user: viewer.id,
                        author: author.id,
                    })
                    .await
            }
            None => Ok(false),
        }
    }
}
