use std::fmt::{self, Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                Display::fmt(&self.0, f)
            }
        }
        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

entity_id!(
    /// Primary key of a [`User`].
    UserId
);
entity_id!(
    /// Primary key of a [`Group`].
    GroupId
);
entity_id!(
    /// Primary key of a [`Post`].
    PostId
);
entity_id!(
    /// Primary key of a [`Comment`].
    CommentId
);

/// Longest accepted username.
pub const USERNAME_MAX_LEN: usize = 150;
/// Longest accepted group title.
pub const GROUP_TITLE_MAX_LEN: usize = 200;
/// Longest accepted group slug.
pub const GROUP_SLUG_MAX_LEN: usize = 100;

/// A registered account.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct User {
    /// Primary key.
    pub id: UserId,
    /// Unique login name, also used in every profile url.
    pub username: String,
    /// Optional first name.
    pub first_name: String,
    /// Optional last name.
    pub last_name: String,
    /// PHC formatted password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Registration time.
    pub date_joined: DateTime<Utc>,
}
impl User {
    /// Full name if one is set, the username otherwise.
    #[must_use]
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_owned()
        }
    }
}
impl Display for User {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.username)
    }
}

/// Data needed to create a [`User`].
#[derive(Clone, Debug, Default)]
pub struct NewUser {
    /// Unique login name.
    pub username: String,
    /// Optional first name.
    pub first_name: String,
    /// Optional last name.
    pub last_name: String,
    /// Already hashed password.
    pub password_hash: String,
}

/// A community posts can be filed under.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Group {
    /// Primary key.
    pub id: GroupId,
    /// Display title.
    pub title: String,
    /// Unique url key.
    pub slug: String,
    /// Free text description.
    pub description: String,
}
impl Display for Group {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

/// Data needed to create a [`Group`].
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct NewGroup {
    /// Display title.
    pub title: String,
    /// Unique url key.
    pub slug: String,
    /// Free text description.
    #[serde(default)]
    pub description: String,
}

/// A published post.
///
/// The author and group are denormalized into the post when it is read from a
/// [`Store`](crate::Store) so that feeds can be rendered without further lookups.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Post {
    /// Primary key.
    pub id: PostId,
    /// Body text.
    pub text: String,
    /// Creation time, set once by the store.
    pub pub_date: DateTime<Utc>,
    /// Author of the post.
    pub author: User,
    /// Group the post was filed under, if any.
    pub group: Option<Group>,
    /// Path of the attached image relative to the media root.
    pub image: Option<String>,
}
impl Display for Post {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let group = self
            .group
            .as_ref()
            .map_or_else(|| "None".to_owned(), |g| g.title.clone());
        let text: String = self.text.chars().take(15).collect();
        write!(
            f,
            "Author: {}; Group: {}; Date: {}; Text: {}...",
            self.author.username,
            group,
            self.pub_date.format("%d.%m.%Y %H:%M"),
            text
        )
    }
}

/// Data needed to create a [`Post`].
#[derive(Clone, Debug)]
pub struct NewPost {
    /// Author of the post.
    pub author: UserId,
    /// Body text.
    pub text: String,
    /// Optional group.
    pub group: Option<GroupId>,
    /// Optional image path relative to the media root.
    pub image: Option<String>,
}

/// Editable fields of a [`Post`]. The author and creation time never change.
#[derive(Clone, Debug, Default)]
pub struct PostChanges {
    /// New body text.
    pub text: String,
    /// New group, `None` detaches the post from its group.
    pub group: Option<GroupId>,
    /// Replacement image. `None` keeps the current one.
    pub image: Option<String>,
}

/// A comment under a post.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Comment {
    /// Primary key.
    pub id: CommentId,
    /// Post the comment belongs to.
    pub post: PostId,
    /// Author of the comment.
    pub author: User,
    /// Body text.
    pub text: String,
    /// Creation time.
    pub created: DateTime<Utc>,
}

/// Data needed to create a [`Comment`].
#[derive(Clone, Debug)]
pub struct NewComment {
    /// Post the comment belongs to.
    pub post: PostId,
    /// Author of the comment.
    pub author: UserId,
    /// Body text.
    pub text: String,
}

/// A directed follow edge: `user` sees `author`'s posts in the following feed.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Follow {
    /// The follower.
    pub user: UserId,
    /// The followed author.
    pub author: UserId,
}

/// Checks a username: 1 to 150 ASCII letters, digits and `@ . + - _`.
pub fn validate_username(username: &str) -> Result<()> {
    if username.is_empty() {
        return Err(Error::invalid("username", "this field is required"));
    }
    if username.chars().count() > USERNAME_MAX_LEN {
        return Err(Error::invalid(
            "username",
            format!("ensure this value has at most {USERNAME_MAX_LEN} characters"),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(Error::invalid(
            "username",
            "enter a valid username: letters, numbers and @/./+/-/_ only",
        ));
    }
    Ok(())
}

/// Checks a group before it is stored.
pub fn validate_group(group: &NewGroup) -> Result<()> {
    if group.title.trim().is_empty() {
        return Err(Error::invalid("title", "this field is required"));
    }
    if group.title.chars().count() > GROUP_TITLE_MAX_LEN {
        return Err(Error::invalid(
            "title",
            format!("ensure this value has at most {GROUP_TITLE_MAX_LEN} characters"),
        ));
    }
    if group.slug.is_empty() || group.slug.len() > GROUP_SLUG_MAX_LEN {
        return Err(Error::invalid(
            "slug",
            format!("slug must have between 1 and {GROUP_SLUG_MAX_LEN} characters"),
        ));
    }
    if !group
        .slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(Error::invalid(
            "slug",
            "use only latin letters, digits, hyphens and underscores",
        ));
    }
    Ok(())
}
