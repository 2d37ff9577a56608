//! Cache Engine Module
//!
//! Main cache engine: a map of containers behind a map-structure lock, with
//! optional write-through to a backing store via the writer task.
//!
//! # Locking
//! Two levels. The map lock (`tokio::sync::RwLock`) is shared for lookups and
//! enumeration and exclusive for inserts and removals; it may be held across
//! an enqueue to the writer. Each [`Container`] has its own lock for value and
//! deadline updates, which is never held across an await.
//!
//! # TTL policy
//! Sliding: every successful `get` and every `set` moves the deadline to
//! now + TTL. Only the janitor evicts; a `get` that races ahead of the sweep
//! still returns the entry and refreshes it.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::cache::stats::StatsRecorder;
use crate::cache::{CacheBuilder, CacheKey, CacheStats, CacheValue, Container, ReleaseHook};
use crate::error::{CacheError, Result};
use crate::persistence::{Action, ActionResponse, Store};
use crate::query::Matcher;

// == Persistence ==
/// Link from a cache to its backing store and writer task.
pub(crate) struct Persistence<K, V> {
    pub store: Arc<dyn Store<K, V>>,
    pub actions: mpsc::Sender<Action<K, V>>,
    pub wait_for_store: bool,
}

impl<K, V> Persistence<K, V> {
    /// Hands an action to the writer, waiting for queue space.
    async fn enqueue(&self, action: Action<K, V>) -> Result<()> {
        self.actions
            .send(action)
            .await
            .map_err(|_| CacheError::WriterClosed)
    }

    /// Enqueues an action and waits for its response.
    async fn request(
        &self,
        action: Action<K, V>,
        response: oneshot::Receiver<ActionResponse<V>>,
    ) -> Result<ActionResponse<V>> {
        self.enqueue(action).await?;
        let response = response.await.map_err(|_| CacheError::WriterClosed)?;
        response.into_result().map_err(CacheError::Store)
    }
}

/// Waits for a mutation's store result when the caller asked for one.
async fn settle<V>(pending: Option<oneshot::Receiver<ActionResponse<V>>>) -> Result<()> {
    match pending {
        Some(response) => {
            let response = response.await.map_err(|_| CacheError::WriterClosed)?;
            response.into_result().map(|_| ()).map_err(CacheError::Store)
        }
        None => Ok(()),
    }
}

// == Shared State ==
pub(crate) struct Shared<K, V> {
    pub entries: RwLock<HashMap<K, Container<V>>>,
    pub ttl: Option<Duration>,
    pub sweep_interval: Duration,
    pub persistence: Option<Persistence<K, V>>,
    pub release: Option<ReleaseHook<V>>,
    pub stats: StatsRecorder,
    /// Bumped under the map write lock on every delete and eviction
    pub removals: AtomicU64,
    pub cancel: CancellationToken,
    pub tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl<K, V> Drop for Shared<K, V> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// == Cache ==
/// Thread-safe generic cache.
///
/// Cloning a `Cache` yields another handle to the same entries. Background
/// tasks (janitor, writer) stop when [`Cache::shutdown`] is called or when
/// the last handle is dropped.
pub struct Cache<K, V> {
    shared: Arc<Shared<K, V>>,
}

impl<K, V> Clone for Cache<K, V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Non-owning handle held by the janitor.
pub(crate) struct WeakCache<K, V> {
    shared: Weak<Shared<K, V>>,
}

impl<K, V> WeakCache<K, V> {
    pub fn upgrade(&self) -> Option<Cache<K, V>> {
        self.shared.upgrade().map(|shared| Cache { shared })
    }
}

impl<K: CacheKey, V: CacheValue> Default for Cache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: CacheKey, V: CacheValue> Cache<K, V> {
    // == Constructors ==
    /// Creates an empty cache whose entries never expire.
    pub fn new() -> Self {
        CacheBuilder::new().build()
    }

    /// Creates a cache seeded with `entries`.
    pub fn from_map(entries: HashMap<K, V>) -> Self {
        CacheBuilder::new().entries(entries).build()
    }

    /// Creates a cache with a sliding TTL and starts its janitor.
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_expiration(ttl: Duration) -> Self {
        CacheBuilder::new().expiration(ttl).build()
    }

    pub fn builder() -> CacheBuilder<K, V> {
        CacheBuilder::new()
    }

    pub(crate) fn from_shared(shared: Shared<K, V>) -> Self {
        Self {
            shared: Arc::new(shared),
        }
    }

    pub(crate) fn downgrade(&self) -> WeakCache<K, V> {
        WeakCache {
            shared: Arc::downgrade(&self.shared),
        }
    }

    pub(crate) fn attach_task(&self, handle: JoinHandle<()>) {
        self.shared.tasks.lock().push(handle);
    }

    // == Accessors ==
    /// Configured TTL, None when entries never expire.
    pub fn ttl(&self) -> Option<Duration> {
        self.shared.ttl
    }

    /// Janitor sleep between sweeps.
    pub fn sweep_interval(&self) -> Duration {
        self.shared.sweep_interval
    }

    pub fn is_persistent(&self) -> bool {
        self.shared.persistence.is_some()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shared.cancel.is_cancelled()
    }

    // == Get ==
    /// Retrieves a value by key and refreshes its deadline.
    ///
    /// On a memory miss a persistent cache asks the store and waits for the
    /// answer; a value found there is cached without being written back.
    /// It is not cached when a delete or eviction ran while the store was
    /// being consulted, so a removed key never reappears in memory.
    ///
    /// # Errors
    /// `NotFound` when neither memory nor the store has the key; `Store` or
    /// `WriterClosed` when the store lookup fails.
    pub async fn get(&self, key: &K) -> Result<V> {
        let generation = {
            let entries = self.shared.entries.read().await;
            if let Some(container) = entries.get(key) {
                container.touch(self.shared.ttl);
                self.shared.stats.record_hit();
                return Ok(container.load());
            }
            self.shared.removals.load(Ordering::SeqCst)
        };

        let Some(persistence) = &self.shared.persistence else {
            self.shared.stats.record_miss();
            return Err(CacheError::not_found(key));
        };

        let (action, response) = Action::get(key.clone());
        let response = persistence.request(action, response).await?;
        match response.value {
            Some(value) => {
                self.shared.stats.record_hit();
                let mut entries = self.shared.entries.write().await;
                if self.shared.removals.load(Ordering::SeqCst) != generation {
                    debug!("Not caching {:?}: removal raced the store read", key);
                    return Ok(value);
                }
                // a concurrent set may have won the race; memory is newer
                let container = entries
                    .entry(key.clone())
                    .or_insert_with(|| Container::new(value, self.shared.ttl));
                Ok(container.load())
            }
            None => {
                self.shared.stats.record_miss();
                Err(CacheError::not_found(key))
            }
        }
    }

    // == Set ==
    /// Stores a key-value pair, overwriting any previous value.
    ///
    /// Memory is updated before this returns. With a store attached a put
    /// is enqueued; in wait-for-store mode the store's result is returned,
    /// otherwise store errors are logged by the writer and dropped.
    pub async fn set(&self, key: K, value: V) -> Result<()> {
        let ttl = self.shared.ttl;

        let Some(persistence) = &self.shared.persistence else {
            {
                let entries = self.shared.entries.read().await;
                if let Some(container) = entries.get(&key) {
                    container.store(value);
                    container.touch(ttl);
                    return Ok(());
                }
            }
            let mut entries = self.shared.entries.write().await;
            upsert(&mut entries, key, value, ttl);
            return Ok(());
        };

        // memory order and store order of one key must agree, so the put is
        // enqueued under the exclusive map lock
        let pending = {
            let mut entries = self.shared.entries.write().await;
            upsert(&mut entries, key.clone(), value.clone(), ttl);
            let (action, pending) = Action::put(key, value, persistence.wait_for_store);
            persistence.enqueue(action).await?;
            pending
        };
        settle(pending).await
    }

    // == Delete ==
    /// Removes a key. Deleting an absent key is not an error.
    ///
    /// The removed value's release hook runs before the map lock is dropped.
    pub async fn delete(&self, key: &K) -> Result<()> {
        let pending = {
            let mut entries = self.shared.entries.write().await;
            self.shared.removals.fetch_add(1, Ordering::SeqCst);
            if let Some(container) = entries.remove(key) {
                self.release(key, &container.into_inner());
            }
            match &self.shared.persistence {
                Some(persistence) => {
                    let (action, pending) =
                        Action::delete(key.clone(), persistence.wait_for_store);
                    persistence.enqueue(action).await?;
                    pending
                }
                None => None,
            }
        };
        settle(pending).await
    }

    // == Exists ==
    /// Checks membership in memory, then in the store when one is attached.
    pub async fn exists(&self, key: &K) -> Result<bool> {
        if self.shared.entries.read().await.contains_key(key) {
            return Ok(true);
        }
        match &self.shared.persistence {
            Some(persistence) => {
                let (action, response) = Action::exists(key.clone());
                Ok(persistence.request(action, response).await?.exists)
            }
            None => Ok(false),
        }
    }

    // == Keys ==
    /// Returns the keys held in memory, unordered.
    pub async fn keys(&self) -> Vec<K> {
        self.shared.entries.read().await.keys().cloned().collect()
    }

    /// Returns memory keys, plus the store's keys when `include_store` is set.
    ///
    /// Store keys are only fetched on request since that is a full store
    /// scan. Keys present in both appear once.
    pub async fn get_keys(&self, include_store: bool) -> Result<Vec<K>> {
        let mut keys = self.keys().await;
        if !include_store {
            return Ok(keys);
        }
        if let Some(persistence) = &self.shared.persistence {
            let stored = persistence.store.keys().await.map_err(CacheError::Store)?;
            let mut seen: HashSet<K> = keys.iter().cloned().collect();
            keys.extend(stored.into_iter().filter(|key| seen.insert(key.clone())));
        }
        Ok(keys)
    }

    // == Iteration ==
    /// Calls `f` for every entry while holding the exclusive map lock.
    ///
    /// Stops at the first error and returns it. `f` must not call back into
    /// this cache: the map lock is already held and the call would deadlock.
    pub async fn each<F, E>(&self, mut f: F) -> std::result::Result<(), E>
    where
        F: FnMut(&K, &V) -> std::result::Result<(), E>,
    {
        let entries = self.shared.entries.write().await;
        for (key, container) in entries.iter() {
            f(key, &container.load())?;
        }
        Ok(())
    }

    /// Snapshot of the entries whose value satisfies `predicate`.
    pub async fn filter<F>(&self, predicate: F) -> HashMap<K, V>
    where
        F: Fn(&V) -> bool,
    {
        let entries = self.shared.entries.read().await;
        entries
            .iter()
            .filter_map(|(key, container)| {
                let value = container.load();
                predicate(&value).then(|| (key.clone(), value))
            })
            .collect()
    }

    /// Snapshot of every entry.
    pub async fn copy(&self) -> HashMap<K, V> {
        self.filter(|_| true).await
    }

    /// Snapshot of every value, unordered.
    pub async fn values(&self) -> Vec<V> {
        let entries = self.shared.entries.read().await;
        entries.values().map(Container::load).collect()
    }

    // == Where ==
    /// Returns the values accepted by `matcher`.
    ///
    /// Without a store, memory is scanned. With a store, the query is handed
    /// to the store through the writer and memory is not consulted: entries
    /// whose put has not landed yet can be missing from the result.
    pub async fn where_matching<M>(&self, matcher: M) -> Result<Vec<V>>
    where
        M: Matcher<V> + 'static,
    {
        match &self.shared.persistence {
            Some(persistence) => {
                let (action, response) = Action::query(Arc::new(matcher));
                Ok(persistence.request(action, response).await?.values)
            }
            None => {
                let entries = self.shared.entries.read().await;
                Ok(entries
                    .values()
                    .map(Container::load)
                    .filter(|value| matcher.is_match(value))
                    .collect())
            }
        }
    }

    // == Length ==
    /// Returns the number of entries held in memory.
    pub async fn len(&self) -> usize {
        self.shared.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.shared.entries.read().await.is_empty()
    }

    /// Remaining TTL of an in-memory entry.
    pub async fn ttl_remaining(&self, key: &K) -> Option<Duration> {
        let entries = self.shared.entries.read().await;
        entries.get(key).and_then(Container::ttl_remaining)
    }

    // == Stats ==
    pub async fn stats(&self) -> CacheStats {
        let total = self.len().await;
        self.shared.stats.snapshot(total)
    }

    // == Evict Expired ==
    /// Removes every expired entry, returning how many were removed.
    ///
    /// With a store attached, each entry's last value is enqueued as a put
    /// before it leaves memory. The write-back is never awaited: the entry
    /// is dropped whether or not the store accepts it.
    pub async fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let expired: Vec<K> = {
            let entries = self.shared.entries.read().await;
            entries
                .iter()
                .filter(|(_, container)| container.expired_at(now))
                .map(|(key, _)| key.clone())
                .collect()
        };

        let mut removed = 0;
        for key in expired {
            let mut entries = self.shared.entries.write().await;
            // a get or set since the scan may have refreshed it
            let Some(container) = entries.get(&key).filter(|c| c.is_expired()) else {
                continue;
            };

            if let Some(persistence) = &self.shared.persistence {
                // enqueued under the lock so a later cold get queues behind it
                let (action, _) = Action::put(key.clone(), container.load(), false);
                match persistence.enqueue(action).await {
                    Ok(()) => self.shared.stats.record_write_back(),
                    Err(err) => warn!("Write-back of {:?} lost: {}", key, err),
                }
            }

            self.shared.removals.fetch_add(1, Ordering::SeqCst);
            if let Some(container) = entries.remove(&key) {
                self.release(&key, &container.into_inner());
            }
            self.shared.stats.record_eviction();
            removed += 1;
        }
        removed
    }

    // == Shutdown ==
    /// Stops the janitor and the writer and waits for both.
    ///
    /// The writer first executes every action already enqueued. Afterwards,
    /// operations that need the store fail with `WriterClosed`.
    pub async fn shutdown(&self) {
        info!("Shutting down cache");
        self.shared.cancel.cancel();
        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.shared.tasks.lock());
        for handle in handles {
            if let Err(err) = handle.await {
                error!("Cache background task failed: {}", err);
            }
        }
    }

    fn release(&self, key: &K, value: &V) {
        if let Some(hook) = &self.shared.release {
            match hook(value) {
                Ok(()) => debug!("Released {:?}", key),
                Err(err) => warn!("Release of {:?} failed: {:#}", key, err),
            }
        }
    }
}

fn upsert<K: CacheKey, V: CacheValue>(
    entries: &mut HashMap<K, Container<V>>,
    key: K,
    value: V,
    ttl: Option<Duration>,
) {
    match entries.entry(key) {
        Entry::Occupied(slot) => {
            slot.get().store(value);
            slot.get().touch(ttl);
        }
        Entry::Vacant(slot) => {
            slot.insert(Container::new(value, ttl));
        }
    }
}
