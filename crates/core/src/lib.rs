//! The core of Yatube: entities, the storage contract, feeds and follow edges.
//!
//! Everything in this crate is independent of HTTP. The web layer resolves a
//! viewer, asks a [`FeedBuilder`] for a page of posts or a [`FollowManager`] to
//! change the follow graph, and renders the result.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod entities;
mod error;
pub mod feed;
pub mod follow;
pub mod pagination;
pub mod store;

pub use self::entities::*;
pub use self::error::Error;
pub use self::feed::{FeedBuilder, FeedPage, Scope};
pub use self::follow::{FollowManager, FollowOutcome};
pub use self::pagination::{Page, Paginator};
pub use self::store::{MemoryStore, PostFilter, Store};

/// Result type which has [`Error`] as its error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Default number of posts on one feed page.
pub const POSTS_PER_PAGE: usize = 10;
