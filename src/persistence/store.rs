//! Backing Store Contract
//!
//! Any storage engine implementing [`Store`] can sit behind a persistent cache.

use async_trait::async_trait;

use crate::query::Matcher;

/// Result type for store operations; errors are opaque to the cache.
pub type StoreResult<T> = anyhow::Result<T>;

// == Store ==
/// Backing store of a persistent cache.
///
/// The cache never inspects store internals. Mutations and reads issued by
/// the cache arrive one at a time from its writer task, in enqueue order;
/// only `keys` is called directly from a cache handle.
#[async_trait]
pub trait Store<K, V>: Send + Sync
where
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Returns the stored value, or None when the key is absent.
    async fn get(&self, key: &K) -> StoreResult<Option<V>>;

    async fn put(&self, key: K, value: V) -> StoreResult<()>;

    async fn delete(&self, key: &K) -> StoreResult<()>;

    async fn exists(&self, key: &K) -> StoreResult<bool>;

    /// Returns every stored value accepted by `matcher`.
    async fn query(&self, matcher: &dyn Matcher<V>) -> StoreResult<Vec<V>>;

    /// Returns every stored key.
    async fn keys(&self) -> StoreResult<Vec<K>>;
}
