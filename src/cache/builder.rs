//! Cache Builder Module
//!
//! Assembles a [`Cache`] and starts its background tasks.

use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cache::stats::StatsRecorder;
use crate::cache::{Cache, CacheKey, CacheValue, Container, Persistence, ReleaseHook, Shared};
use crate::config::CacheConfig;
use crate::persistence::{Store, ACTION_QUEUE_CAPACITY};
use crate::tasks::{spawn_janitor_task, spawn_writer_task};

// == Cache Builder ==
/// Configures and builds a [`Cache`].
///
/// # Example
/// ```no_run
/// # async fn demo() -> ttl_cache::Result<()> {
/// use std::time::Duration;
/// use ttl_cache::{Cache, MemoryStore};
///
/// let cache: Cache<String, String> = Cache::builder()
///     .expiration(Duration::from_secs(300))
///     .store(MemoryStore::new())
///     .wait_for_store(true)
///     .build();
///
/// cache.set("user:1".to_string(), "alice".to_string()).await?;
/// cache.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct CacheBuilder<K, V> {
    config: CacheConfig,
    store: Option<Arc<dyn Store<K, V>>>,
    release: Option<ReleaseHook<V>>,
    entries: HashMap<K, V>,
}

impl<K: CacheKey, V: CacheValue> Default for CacheBuilder<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: CacheKey, V: CacheValue> CacheBuilder<K, V> {
    pub fn new() -> Self {
        Self::from_config(CacheConfig::default())
    }

    /// Starts from a loaded configuration, e.g. [`CacheConfig::from_env`].
    pub fn from_config(config: CacheConfig) -> Self {
        Self {
            config,
            store: None,
            release: None,
            entries: HashMap::new(),
        }
    }

    /// Sets the sliding TTL and enables the janitor.
    pub fn expiration(mut self, ttl: Duration) -> Self {
        self.config.default_ttl = Some(ttl);
        self
    }

    /// Overrides the minimum janitor sleep.
    pub fn sweep_floor(mut self, floor: Duration) -> Self {
        self.config.sweep_floor = Some(floor);
        self
    }

    /// Makes `set` and `delete` wait for the store and return its error.
    pub fn wait_for_store(mut self, wait: bool) -> Self {
        self.config.wait_for_store = wait;
        self
    }

    /// Attaches a backing store.
    pub fn store<S>(self, store: S) -> Self
    where
        S: Store<K, V> + 'static,
    {
        self.shared_store(Arc::new(store))
    }

    /// Attaches a backing store that is also used elsewhere.
    pub fn shared_store(mut self, store: Arc<dyn Store<K, V>>) -> Self {
        self.store = Some(store);
        self
    }

    /// Registers the hook run on values removed by delete or eviction.
    pub fn on_release<F>(mut self, hook: F) -> Self
    where
        F: Fn(&V) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.release = Some(Arc::new(hook));
        self
    }

    /// Seeds the cache. Seeded entries are not written to the store.
    pub fn entries(mut self, entries: HashMap<K, V>) -> Self {
        self.entries.extend(entries);
        self
    }

    // == Build ==
    /// Builds the cache.
    ///
    /// Spawns the writer when a store is attached and the janitor when a TTL
    /// is set; in either case this must run inside a tokio runtime.
    pub fn build(self) -> Cache<K, V> {
        let ttl = self.config.default_ttl;
        let persistent = self.store.is_some();
        let sweep_interval = self.config.sweep_interval(persistent);
        let cancel = CancellationToken::new();

        let mut writer = None;
        let persistence = self.store.map(|store| {
            let (actions, queue) = mpsc::channel(ACTION_QUEUE_CAPACITY);
            writer = Some(spawn_writer_task(store.clone(), queue, cancel.child_token()));
            Persistence {
                store,
                actions,
                wait_for_store: self.config.wait_for_store,
            }
        });

        let entries = self
            .entries
            .into_iter()
            .map(|(key, value)| (key, Container::new(value, ttl)))
            .collect();

        let cache = Cache::from_shared(Shared {
            entries: RwLock::new(entries),
            ttl,
            sweep_interval,
            persistence,
            release: self.release,
            stats: StatsRecorder::default(),
            removals: AtomicU64::new(0),
            cancel: cancel.clone(),
            tasks: Mutex::new(Vec::new()),
        });

        if let Some(handle) = writer {
            cache.attach_task(handle);
        }
        if ttl.is_some() {
            let handle = spawn_janitor_task(cache.downgrade(), sweep_interval, cancel.child_token());
            cache.attach_task(handle);
        }

        info!(
            "Cache built: ttl={:?}, sweep_interval={:?}, persistent={}",
            ttl, sweep_interval, persistent
        );
        cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MEMORY_SWEEP_FLOOR, PERSISTENT_SWEEP_FLOOR};
    use crate::persistence::MemoryStore;

    #[test]
    fn test_memory_cache_needs_no_runtime() {
        let cache: Cache<String, u32> = CacheBuilder::new()
            .entries(HashMap::from([("a".to_string(), 1)]))
            .build();
        assert!(!cache.is_persistent());
        assert_eq!(cache.sweep_interval(), MEMORY_SWEEP_FLOOR);
    }

    #[tokio::test]
    async fn test_persistent_floor() {
        let cache: Cache<String, u32> = CacheBuilder::new()
            .expiration(Duration::from_secs(1))
            .store(MemoryStore::new())
            .build();
        assert!(cache.is_persistent());
        assert_eq!(cache.sweep_interval(), PERSISTENT_SWEEP_FLOOR);
        cache.shutdown().await;
    }

    #[tokio::test]
    async fn test_from_config() {
        let config = CacheConfig {
            default_ttl: Some(Duration::from_secs(90)),
            sweep_floor: None,
            wait_for_store: false,
        };
        let cache: Cache<String, u32> = CacheBuilder::from_config(config).build();
        assert_eq!(cache.ttl(), Some(Duration::from_secs(90)));
        assert_eq!(cache.sweep_interval(), Duration::from_secs(90));
        cache.shutdown().await;
    }
}
