//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ttl_cache::cache::{CacheKey, CacheValue};
use ttl_cache::persistence::StoreResult;
use ttl_cache::{CacheBuilder, Matcher, Store};

/// Installs a test-friendly tracing subscriber once per test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ttl_cache=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

/// Builder for a cache backed by `store`.
pub fn builder_with<K, V>(store: &Arc<RecordingStore<K, V>>) -> CacheBuilder<K, V>
where
    K: CacheKey,
    V: CacheValue,
{
    let backing: Arc<dyn Store<K, V>> = store.clone();
    CacheBuilder::new().shared_store(backing)
}

/// One call received by a [`RecordingStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall<K, V> {
    Get(K),
    Put(K, V),
    Delete(K),
    Exists(K),
    Query,
    Keys,
}

/// Map-backed store that records every call. It can be told to fail reads
/// or writes, and to park `get` until the test lets it through.
pub struct RecordingStore<K, V> {
    entries: Mutex<HashMap<K, V>>,
    calls: Mutex<Vec<StoreCall<K, V>>>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
    hold_gets: AtomicBool,
    get_entered: Notify,
    get_released: Notify,
}

impl<K, V> RecordingStore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::seeded(HashMap::new())
    }

    pub fn seeded(entries: HashMap<K, V>) -> Self {
        Self {
            entries: Mutex::new(entries),
            calls: Mutex::new(Vec::new()),
            fail_writes: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
            hold_gets: AtomicBool::new(false),
            get_entered: Notify::new(),
            get_released: Notify::new(),
        }
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes the next `get` wait inside the store until `release_get`.
    pub fn hold_gets(&self) {
        self.hold_gets.store(true, Ordering::SeqCst);
    }

    /// Resolves once a held `get` is inside the store.
    pub async fn get_entered(&self) {
        self.get_entered.notified().await;
    }

    pub fn release_get(&self) {
        self.hold_gets.store(false, Ordering::SeqCst);
        self.get_released.notify_one();
    }

    pub fn calls(&self) -> Vec<StoreCall<K, V>> {
        self.calls.lock().clone()
    }

    pub fn puts(&self) -> Vec<(K, V)> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                StoreCall::Put(k, v) => Some((k.clone(), v.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn peek(&self, key: &K) -> Option<V> {
        self.entries.lock().get(key).cloned()
    }

    fn record(&self, call: StoreCall<K, V>) {
        self.calls.lock().push(call);
    }

    fn check_writable(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            anyhow::bail!("store is read-only");
        }
        Ok(())
    }

    fn check_readable(&self) -> StoreResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            anyhow::bail!("store is unreachable");
        }
        Ok(())
    }
}

#[async_trait]
impl<K, V> Store<K, V> for RecordingStore<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &K) -> StoreResult<Option<V>> {
        self.record(StoreCall::Get(key.clone()));
        if self.hold_gets.load(Ordering::SeqCst) {
            self.get_entered.notify_one();
            self.get_released.notified().await;
        }
        self.check_readable()?;
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn put(&self, key: K, value: V) -> StoreResult<()> {
        self.record(StoreCall::Put(key.clone(), value.clone()));
        self.check_writable()?;
        self.entries.lock().insert(key, value);
        Ok(())
    }

    async fn delete(&self, key: &K) -> StoreResult<()> {
        self.record(StoreCall::Delete(key.clone()));
        self.check_writable()?;
        self.entries.lock().remove(key);
        Ok(())
    }

    async fn exists(&self, key: &K) -> StoreResult<bool> {
        self.record(StoreCall::Exists(key.clone()));
        self.check_readable()?;
        Ok(self.entries.lock().contains_key(key))
    }

    async fn query(&self, matcher: &dyn Matcher<V>) -> StoreResult<Vec<V>> {
        self.record(StoreCall::Query);
        self.check_readable()?;
        Ok(self
            .entries
            .lock()
            .values()
            .filter(|v| matcher.is_match(v))
            .cloned()
            .collect())
    }

    async fn keys(&self) -> StoreResult<Vec<K>> {
        self.record(StoreCall::Keys);
        self.check_readable()?;
        Ok(self.entries.lock().keys().cloned().collect())
    }
}
