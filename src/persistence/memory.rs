//! In-process reference store.

use std::collections::HashMap;
use std::hash::Hash;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::persistence::{Store, StoreResult};
use crate::query::Matcher;

// == Memory Store ==
/// A [`Store`] backed by a plain hash map.
///
/// Useful as a stand-in for a real storage engine and for seeding caches in
/// tests. It never fails.
#[derive(Debug, Default)]
pub struct MemoryStore<K, V> {
    entries: RwLock<HashMap<K, V>>,
}

impl<K, V> MemoryStore<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a store pre-populated with `entries`.
    pub fn from_map(entries: HashMap<K, V>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl<K, V> MemoryStore<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Reads a value directly, bypassing any cache.
    pub fn peek(&self, key: &K) -> Option<V> {
        self.entries.read().get(key).cloned()
    }
}

#[async_trait]
impl<K, V> Store<K, V> for MemoryStore<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &K) -> StoreResult<Option<V>> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn put(&self, key: K, value: V) -> StoreResult<()> {
        self.entries.write().insert(key, value);
        Ok(())
    }

    async fn delete(&self, key: &K) -> StoreResult<()> {
        self.entries.write().remove(key);
        Ok(())
    }

    async fn exists(&self, key: &K) -> StoreResult<bool> {
        Ok(self.entries.read().contains_key(key))
    }

    async fn query(&self, matcher: &dyn Matcher<V>) -> StoreResult<Vec<V>> {
        Ok(self
            .entries
            .read()
            .values()
            .filter(|v| matcher.is_match(v))
            .cloned()
            .collect())
    }

    async fn keys(&self) -> StoreResult<Vec<K>> {
        Ok(self.entries.read().keys().cloned().collect())
    }
}
