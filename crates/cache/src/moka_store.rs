//! [`CacheStore`] on top of moka's async cache.
use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache as MokaCache;
use moka::future::CacheBuilder as MokaCacheBuilder;
use moka::notification::RemovalCause;

use super::{CacheStore, CachedPage};

/// Configures a [`MokaStore`] before it is built.
pub struct Builder<K> {
    inner: MokaCacheBuilder<K, CachedPage, MokaCache<K, CachedPage>>,
}
impl<K> fmt::Debug for Builder<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder").finish_non_exhaustive()
    }
}
impl<K> Builder<K>
where
    K: Hash + Eq + Send + Sync + Clone + 'static,
{
    /// Sets the max capacity (number of entries) of the cache.
    #[must_use]
    pub fn max_capacity(mut self, capacity: u64) -> Self {
        self.inner = self.inner.max_capacity(capacity);
        self
    }

    /// Sets the time to live of the cache.
    ///
    /// A page expires once the duration has passed since it was rendered,
    /// however often it is read in between.
    #[must_use]
    pub fn time_to_live(mut self, duration: Duration) -> Self {
        self.inner = self.inner.time_to_live(duration);
        self
    }

    /// Logs every page dropped for a reason other than replacement.
    #[must_use]
    pub fn log_evictions(mut self) -> Self
    where
        K: std::fmt::Debug,
    {
        self.inner = self
            .inner
            .eviction_listener(|key: Arc<K>, _page: CachedPage, cause: RemovalCause| {
                if cause != RemovalCause::Replaced {
                    tracing::trace!(?key, ?cause, "cached page dropped");
                }
            });
        self
    }

    /// Builds the store.
    ///
    /// # Panics
    ///
    /// Panics if the time to live is longer than 1000 years, which moka rejects.
    #[must_use]
    pub fn build(self) -> MokaStore<K> {
        MokaStore {
            inner: self.inner.build(),
        }
    }
}

/// An in-memory [`CacheStore`] backed by moka.
pub struct MokaStore<K> {
    inner: MokaCache<K, CachedPage>,
}
impl<K> fmt::Debug for MokaStore<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MokaStore").finish_non_exhaustive()
    }
}
impl<K> MokaStore<K>
where
    K: Hash + Eq + Send + Sync + Clone + 'static,
{
    /// Create a new `MokaStore` without expiry.
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: MokaCache::new(max_capacity),
        }
    }

    /// Returns a [`Builder`], which can build a `MokaStore`.
    #[must_use]
    pub fn builder() -> Builder<K> {
        Builder {
            inner: MokaCache::builder(),
        }
    }
}

impl<K> CacheStore for MokaStore<K>
where
    K: Hash + Eq + Send + Sync + Clone + 'static,
{
    type Key = K;

    async fn load_entry<Q>(&self, key: &Q) -> Option<CachedPage>
    where
        Self::Key: Borrow<Q>,
        Q: Hash + Eq + Sync + ?Sized,
    {
        self.inner.get(key).await
    }

    async fn save_entry(&self, key: Self::Key, entry: CachedPage) {
        self.inner.insert(key, entry).await;
    }

    fn clear(&self) {
        self.inner.invalidate_all();
    }
}
