//! Time-limited cache of rendered pages.
//!
//! A [`PageCache`] keeps rendered HTML for a fixed interval. Entries are only
//! dropped when they expire or when [`PageCache::clear`] is called; writes to
//! the underlying data do not invalidate them, so a page may be stale for up
//! to one time-to-live.
//!
//! ```no_run
//! use std::time::Duration;
//! use yatube_cache::{MokaStore, PageCache};
//!
//! # async fn render() -> Result<String, std::io::Error> { Ok(String::new()) }
//! # async fn run() -> Result<(), std::io::Error> {
//! let cache = PageCache::new(
//!     MokaStore::<String>::builder()
//!         .time_to_live(Duration::from_secs(20))
//!         .build(),
//! );
//! let html = cache.get_or_render("1".to_owned(), render()).await?;
//! # Ok(())
//! # }
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::borrow::Borrow;
use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

#[cfg(feature = "moka-store")]
mod moka_store;
#[cfg(feature = "moka-store")]
pub use moka_store::{Builder, MokaStore};

/// A rendered page kept in a [`CacheStore`].
#[derive(Clone, Debug)]
pub struct CachedPage {
    body: Arc<str>,
}
impl CachedPage {
    /// Create a new `CachedPage`.
    #[must_use]
    pub fn new(body: impl Into<Arc<str>>) -> Self {
        Self {
            body: body.into(),
        }
    }

    /// The rendered body.
    #[must_use]
    pub fn body(&self) -> &Arc<str> {
        &self.body
    }
}

/// Storage backend of a [`PageCache`].
pub trait CacheStore: Send + Sync + 'static {
    /// Key type.
    type Key: Hash + Eq + Send + Sync + Clone + 'static;

    /// Get a live entry, `None` if it is missing or expired.
    fn load_entry<Q>(&self, key: &Q) -> impl Future<Output = Option<CachedPage>> + Send
    where
        Self::Key: Borrow<Q>,
        Q: Hash + Eq + Sync + ?Sized;

    /// Save an entry, replacing any entry under the same key.
    fn save_entry(&self, key: Self::Key, entry: CachedPage) -> impl Future<Output = ()> + Send;

    /// Drop every entry.
    fn clear(&self);
}

/// A process-wide cache of rendered pages over a [`CacheStore`].
///
/// Clones share the same store.
pub struct PageCache<S> {
    store: Arc<S>,
}
impl<S> Clone for PageCache<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}
impl<S> Debug for PageCache<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageCache").finish_non_exhaustive()
    }
}

impl<S> PageCache<S>
where
    S: CacheStore,
{
    /// Create a new `PageCache`.
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Get the page stored under `key`, if it is still live.
    pub async fn get<Q>(&self, key: &Q) -> Option<Arc<str>>
    where
        S::Key: Borrow<Q>,
        Q: Hash + Eq + Sync + ?Sized,
    {
        self.store
            .load_entry(key)
            .await
            .map(|entry| entry.body().clone())
    }

    /// Store a rendered page under `key`.
    pub async fn insert(&self, key: S::Key, body: impl Into<Arc<str>>) -> Arc<str> {
        let entry = CachedPage::new(body);
        let body = entry.body().clone();
        self.store.save_entry(key, entry).await;
        body
    }

    /// Returns the page stored under `key`, rendering and storing it first
    /// when there is no live entry.
    ///
    /// Failed renders are not cached.
    pub async fn get_or_render<F, E>(&self, key: S::Key, render: F) -> Result<Arc<str>, E>
    where
        F: Future<Output = Result<String, E>>,
    {
        if let Some(body) = self.get(&key).await {
            tracing::debug!("page cache hit");
            return Ok(body);
        }
        tracing::debug!("page cache miss");
        let body = render.await?;
        Ok(self.insert(key, body).await)
    }

    /// Drop every cached page.
    pub fn clear(&self) {
        tracing::debug!("page cache cleared");
        self.store.clear();
    }
}

#[cfg(all(test, feature = "moka-store"))]
mod tests {
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    fn cache(ttl: Duration) -> PageCache<MokaStore<String>> {
        PageCache::new(MokaStore::builder().time_to_live(ttl).build())
    }

    async fn render(counter: &AtomicUsize) -> Result<String, Infallible> {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        Ok(format!("<p>render {n}</p>"))
    }

    #[tokio::test]
    async fn test_hit_within_ttl() {
        let cache = cache(Duration::from_secs(20));
        let counter = AtomicUsize::new(0);
        let first = cache
            .get_or_render("1".to_owned(), render(&counter))
            .await
            .unwrap();
        let second = cache
            .get_or_render("1".to_owned(), render(&counter))
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(&*first, "<p>render 0</p>");
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let cache = cache(Duration::from_secs(20));
        let counter = AtomicUsize::new(0);
        let one = cache
            .get_or_render("1".to_owned(), render(&counter))
            .await
            .unwrap();
        let two = cache
            .get_or_render("2".to_owned(), render(&counter))
            .await
            .unwrap();
        assert_ne!(one, two);
        assert_eq!(cache.get("1").await, Some(one));
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = cache(Duration::from_secs(20));
        let counter = AtomicUsize::new(0);
        cache
            .get_or_render("1".to_owned(), render(&counter))
            .await
            .unwrap();
        cache.clear();
        assert!(cache.get("1").await.is_none());
        let fresh = cache
            .get_or_render("1".to_owned(), render(&counter))
            .await
            .unwrap();
        assert_eq!(&*fresh, "<p>render 1</p>");
    }

    #[tokio::test]
    async fn test_expiry() {
        let cache = cache(Duration::from_millis(100));
        cache.insert("1".to_owned(), "old").await;
        assert!(cache.get("1").await.is_some());
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(cache.get("1").await.is_none());
    }

    #[tokio::test]
    async fn test_failed_render_is_not_cached() {
        let cache = cache(Duration::from_secs(20));
        let failed: Result<Arc<str>, &str> = cache
            .get_or_render("1".to_owned(), async { Err("boom") })
            .await;
        assert!(failed.is_err());
        assert!(cache.get("1").await.is_none());
    }
}
