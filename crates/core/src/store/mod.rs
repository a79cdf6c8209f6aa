//! The storage contract.
//!
//! A [`Store`] owns users, groups, posts, comments and follow edges, and
//! implements the relational rules between them:
//!
//! * deleting a user deletes their posts, comments and follow edges (both
//!   directions);
//! * deleting a post deletes its comments;
//! * deleting a group detaches its posts instead of deleting them;
//! * usernames and group slugs are unique;
//! * a follow edge `(user, author)` exists at most once and never with
//!   `user == author`.
//!
//! Posts are always returned newest first, ties broken by the newer id.
use async_trait::async_trait;

use crate::{
    Comment, Follow, Group, GroupId, NewComment, NewGroup, NewPost, NewUser, Post, PostChanges,
    PostId, Result, User, UserId,
};

mod memory;
pub use memory::MemoryStore;

/// Selects the posts a feed is built from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PostFilter {
    /// Every post.
    All,
    /// Posts filed under one group.
    Group(GroupId),
    /// Posts written by one author.
    Author(UserId),
    /// Posts written by any of the listed authors.
    Authors(Vec<UserId>),
}
impl PostFilter {
    /// Returns `true` when the post with the given author and group passes the filter.
    #[must_use]
    pub fn matches(&self, author: UserId, group: Option<GroupId>) -> bool {
        match self {
            Self::All => true,
            Self::Group(id) => group == Some(*id),
            Self::Author(id) => author == *id,
            Self::Authors(ids) => ids.contains(&author),
        }
    }
}

/// Persistent storage for every Yatube entity.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Creates a user. Fails with `Conflict` if the username is taken.
    async fn create_user(&self, user: NewUser) -> Result<User>;
    /// Looks a user up by id.
    async fn user(&self, id: UserId) -> Result<User>;
    /// Looks a user up by username.
    async fn user_by_username(&self, username: &str) -> Result<User>;
    /// Deletes a user with their posts, comments and follow edges.
    async fn delete_user(&self, id: UserId) -> Result<()>;

    /// Creates a group. Fails with `Conflict` if the slug is taken.
    async fn create_group(&self, group: NewGroup) -> Result<Group>;
    /// Looks a group up by slug.
    async fn group_by_slug(&self, slug: &str) -> Result<Group>;
    /// All groups ordered by title.
    async fn groups(&self) -> Result<Vec<Group>>;
    /// Deletes a group, detaching its posts.
    async fn delete_group(&self, id: GroupId) -> Result<()>;

    /// Creates a post stamped with the current time.
    async fn create_post(&self, post: NewPost) -> Result<Post>;
    /// Looks a post up by id.
    async fn post(&self, id: PostId) -> Result<Post>;
    /// Applies edits to a post and returns the updated post.
    async fn update_post(&self, id: PostId, changes: PostChanges) -> Result<Post>;
    /// Deletes a post with its comments.
    async fn delete_post(&self, id: PostId) -> Result<()>;
    /// Number of posts passing the filter.
    async fn count_posts(&self, filter: &PostFilter) -> Result<usize>;
    /// A window of the posts passing the filter, newest first.
    async fn posts(&self, filter: &PostFilter, offset: usize, limit: usize) -> Result<Vec<Post>>;

    /// Creates a comment.
    async fn create_comment(&self, comment: NewComment) -> Result<Comment>;
    /// Comments of a post, newest first.
    async fn comments(&self, post: PostId) -> Result<Vec<Comment>>;

    /// Inserts a follow edge unless it already exists. Returns `true` if the
    /// edge was created. Check and insert happen atomically.
    async fn insert_follow(&self, follow: Follow) -> Result<bool>;
    /// Removes a follow edge. Returns `true` if it existed.
    async fn delete_follow(&self, follow: Follow) -> Result<bool>;
    /// Whether the edge exists.
    async fn follow_exists(&self, follow: Follow) -> Result<bool>;
    /// Authors the user follows.
    async fn followed_authors(&self, user: UserId) -> Result<Vec<UserId>>;
}
