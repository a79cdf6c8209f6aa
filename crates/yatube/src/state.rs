use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;

use salvo::Depot;
use yatube_cache::{MokaStore, PageCache};
use yatube_core::{FeedBuilder, FollowManager, MemoryStore, Paginator, Store};

use crate::auth::Passwords;
use crate::config::Config;
use crate::{AppError, AppResult};

/// Cache of rendered index post lists, keyed by the raw `page` query value.
pub type IndexCache = PageCache<MokaStore<String>>;

/// Services shared by every request, injected with `affix_state`.
#[derive(Clone)]
pub struct AppState {
    /// Entity storage.
    pub store: Arc<dyn Store>,
    /// Feed pages.
    pub feeds: FeedBuilder,
    /// Follow edges.
    pub follows: FollowManager,
    /// Cached index post lists.
    pub index_cache: IndexCache,
    /// Password hashing.
    pub passwords: Passwords,
    /// Loaded configuration.
    pub config: Arc<Config>,
}
impl Debug for AppState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("feeds", &self.feeds)
            .field("passwords", &self.passwords)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Builds the state over an empty in-memory store.
    pub fn new(config: Config) -> AppResult<Self> {
        Self::with_store(config, Arc::new(MemoryStore::new()))
    }

    /// Builds the state over the given store.
    pub fn with_store(config: Config, store: Arc<dyn Store>) -> AppResult<Self> {
        let feeds = FeedBuilder::new(store.clone(), Paginator::new(config.feed.posts_per_page));
        let follows = FollowManager::new(store.clone());
        let index_cache = PageCache::new(
            MokaStore::builder()
                .max_capacity(config.feed.index_cache_capacity)
                .time_to_live(Duration::from_secs(config.feed.index_cache_ttl_secs))
                .log_evictions()
                .build(),
        );
        let passwords = Passwords::new(config.auth.hash_memory_kib, config.auth.hash_iterations)?;
        Ok(Self {
            store,
            feeds,
            follows,
            index_cache,
            passwords,
            config: Arc::new(config),
        })
    }

    /// Creates the configured groups that do not exist yet.
    pub async fn seed_groups(&self) -> AppResult<()> {
        for group in &self.config.groups {
            match self.store.group_by_slug(&group.slug).await {
                Ok(_) => {}
                Err(e) if e.is_not_found() => {
                    let created = self.store.create_group(group.clone()).await?;
                    tracing::info!(slug = %created.slug, "group created");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Gets the state injected into the depot.
    pub fn from_depot(depot: &Depot) -> AppResult<Self> {
        depot
            .obtain::<Self>()
            .cloned()
            .map_err(|_| AppError::MissingState)
    }
}
