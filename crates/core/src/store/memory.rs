//! In-memory store.
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashSet};
use std::fmt::{self, Debug, Formatter};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::{PostFilter, Store};
use crate::{
    Comment, CommentId, Error, Follow, Group, GroupId, NewComment, NewGroup, NewPost, NewUser,
    Post, PostChanges, PostId, Result, User, UserId, validate_group, validate_username,
};

struct PostRow {
    id: PostId,
    text: String,
    pub_date: DateTime<Utc>,
    author: UserId,
    group: Option<GroupId>,
    image: Option<String>,
}

struct CommentRow {
    id: CommentId,
    post: PostId,
    author: UserId,
    text: String,
    created: DateTime<Utc>,
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    groups: BTreeMap<GroupId, Group>,
    posts: BTreeMap<PostId, PostRow>,
    comments: BTreeMap<CommentId, CommentRow>,
    follows: HashSet<Follow>,
    last_id: u64,
}
impl Tables {
    fn next_id(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }

    fn user(&self, id: UserId) -> Result<&User> {
        self.users
            .get(&id)
            .ok_or_else(|| Error::not_found(format!("user {id}")))
    }

    fn group(&self, id: GroupId) -> Result<&Group> {
        self.groups
            .get(&id)
            .ok_or_else(|| Error::not_found(format!("group {id}")))
    }

    fn hydrate_post(&self, row: &PostRow) -> Result<Post> {
        Ok(Post {
            id: row.id,
            text: row.text.clone(),
            pub_date: row.pub_date,
            author: self.user(row.author)?.clone(),
            group: row.group.map(|id| self.group(id).cloned()).transpose()?,
            image: row.image.clone(),
        })
    }

    fn hydrate_comment(&self, row: &CommentRow) -> Result<Comment> {
        Ok(Comment {
            id: row.id,
            post: row.post,
            author: self.user(row.author)?.clone(),
            text: row.text.clone(),
            created: row.created,
        })
    }

    fn remove_post(&mut self, id: PostId) {
        self.posts.remove(&id);
        self.comments.retain(|_, comment| comment.post != id);
    }
}

/// A [`Store`] keeping everything in process memory.
///
/// All tables sit behind a single lock, so every operation is atomic with
/// respect to every other one. Clones share the same tables.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: std::sync::Arc<RwLock<Tables>>,
}
impl Debug for MemoryStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let tables = self.tables.read();
        f.debug_struct("MemoryStore")
            .field("users", &tables.users.len())
            .field("groups", &tables.groups.len())
            .field("posts", &tables.posts.len())
            .field("comments", &tables.comments.len())
            .field("follows", &tables.follows.len())
            .finish()
    }
}
impl MemoryStore {
    /// Create an empty `MemoryStore`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        validate_username(&user.username)?;
        let mut tables = self.tables.write();
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(Error::conflict(format!(
                "a user with username {} already exists",
                user.username
            )));
        }
        let user = User {
            id: UserId(tables.next_id()),
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            password_hash: user.password_hash,
            date_joined: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());
        tracing::debug!(id = %user.id, username = %user.username, "user created");
        Ok(user)
    }

    async fn user(&self, id: UserId) -> Result<User> {
        self.tables.read().user(id).cloned()
    }

    async fn user_by_username(&self, username: &str) -> Result<User> {
        self.tables
            .read()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("user {username}")))
    }

    async fn delete_user(&self, id: UserId) -> Result<()> {
        let mut tables = self.tables.write();
        tables.user(id)?;
        let posts: Vec<PostId> = tables
            .posts
            .values()
            .filter(|post| post.author == id)
            .map(|post| post.id)
            .collect();
        for post in posts {
            tables.remove_post(post);
        }
        tables.comments.retain(|_, comment| comment.author != id);
        tables
            .follows
            .retain(|follow| follow.user != id && follow.author != id);
        tables.users.remove(&id);
        Ok(())
    }

    async fn create_group(&self, group: NewGroup) -> Result<Group> {
        validate_group(&group)?;
        let mut tables = self.tables.write();
        if tables.groups.values().any(|g| g.slug == group.slug) {
            return Err(Error::conflict(format!(
                "a group with slug {} already exists",
                group.slug
            )));
        }
        let group = Group {
            id: GroupId(tables.next_id()),
            title: group.title,
            slug: group.slug,
            description: group.description,
        };
        tables.groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn group_by_slug(&self, slug: &str) -> Result<Group> {
        self.tables
            .read()
            .groups
            .values()
            .find(|g| g.slug == slug)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("group {slug}")))
    }

    async fn groups(&self) -> Result<Vec<Group>> {
        let mut groups: Vec<Group> = self.tables.read().groups.values().cloned().collect();
        groups.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(groups)
    }

    async fn delete_group(&self, id: GroupId) -> Result<()> {
        let mut tables = self.tables.write();
        tables.group(id)?;
        for post in tables.posts.values_mut() {
            if post.group == Some(id) {
                post.group = None;
            }
        }
        tables.groups.remove(&id);
        Ok(())
    }

    async fn create_post(&self, post: NewPost) -> Result<Post> {
        let mut tables = self.tables.write();
        tables.user(post.author)?;
        if let Some(group) = post.group {
            tables.group(group)?;
        }
        let row = PostRow {
            id: PostId(tables.next_id()),
            text: post.text,
            pub_date: Utc::now(),
            author: post.author,
            group: post.group,
            image: post.image,
        };
        let post = tables.hydrate_post(&row)?;
        tables.posts.insert(row.id, row);
        Ok(post)
    }

    async fn post(&self, id: PostId) -> Result<Post> {
        let tables = self.tables.read();
        let row = tables
            .posts
            .get(&id)
            .ok_or_else(|| Error::not_found(format!("post {id}")))?;
        tables.hydrate_post(row)
    }

    async fn update_post(&self, id: PostId, changes: PostChanges) -> Result<Post> {
        let mut tables = self.tables.write();
        if let Some(group) = changes.group {
            tables.group(group)?;
        }
        let row = tables
            .posts
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(format!("post {id}")))?;
        row.text = changes.text;
        row.group = changes.group;
        if changes.image.is_some() {
            row.image = changes.image;
        }
        let tables = &*tables;
        let row = tables
            .posts
            .get(&id)
            .ok_or_else(|| Error::not_found(format!("post {id}")))?;
        tables.hydrate_post(row)
    }

    async fn delete_post(&self, id: PostId) -> Result<()> {
        let mut tables = self.tables.write();
        if !tables.posts.contains_key(&id) {
            return Err(Error::not_found(format!("post {id}")));
        }
        tables.remove_post(id);
        Ok(())
    }

    async fn count_posts(&self, filter: &PostFilter) -> Result<usize> {
        Ok(self
            .tables
            .read()
            .posts
            .values()
            .filter(|post| filter.matches(post.author, post.group))
            .count())
    }

    async fn posts(&self, filter: &PostFilter, offset: usize, limit: usize) -> Result<Vec<Post>> {
        let tables = self.tables.read();
        let mut rows: Vec<&PostRow> = tables
            .posts
            .values()
            .filter(|post| filter.matches(post.author, post.group))
            .collect();
        rows.sort_by_key(|post| (Reverse(post.pub_date), Reverse(post.id)));
        rows.into_iter()
            .skip(offset)
            .take(limit)
            .map(|row| tables.hydrate_post(row))
            .collect()
    }

    async fn create_comment(&self, comment: NewComment) -> Result<Comment> {
        let mut tables = self.tables.write();
        tables.user(comment.author)?;
        if !tables.posts.contains_key(&comment.post) {
            return Err(Error::not_found(format!("post {}", comment.post)));
        }
        let row = CommentRow {
            id: CommentId(tables.next_id()),
            post: comment.post,
            author: comment.author,
            text: comment.text,
            created: Utc::now(),
        };
        let comment = tables.hydrate_comment(&row)?;
        tables.comments.insert(row.id, row);
        Ok(comment)
    }

    async fn comments(&self, post: PostId) -> Result<Vec<Comment>> {
        let tables = self.tables.read();
        let mut rows: Vec<&CommentRow> = tables
            .comments
            .values()
            .filter(|comment| comment.post == post)
            .collect();
        rows.sort_by_key(|comment| (Reverse(comment.created), Reverse(comment.id)));
        rows.into_iter()
            .map(|row| tables.hydrate_comment(row))
            .collect()
    }

    async fn insert_follow(&self, follow: Follow) -> Result<bool> {
        if follow.user == follow.author {
            return Err(Error::invalid("author", "users cannot follow themselves"));
        }
        let mut tables = self.tables.write();
        tables.user(follow.user)?;
        tables.user(follow.author)?;
        Ok(tables.follows.insert(follow))
    }

    async fn delete_follow(&self, follow: Follow) -> Result<bool> {
        Ok(self.tables.write().follows.remove(&follow))
    }

    async fn follow_exists(&self, follow: Follow) -> Result<bool> {
        Ok(self.tables.read().follows.contains(&follow))
    }

    async fn followed_authors(&self, user: UserId) -> Result<Vec<UserId>> {
        let mut authors: Vec<UserId> = self
            .tables
            .read()
            .follows
            .iter()
            .filter(|follow| follow.user == user)
            .map(|follow| follow.author)
            .collect();
        authors.sort();
        Ok(authors)
    }
}
