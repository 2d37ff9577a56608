//! Cache Module
//!
//! Generic in-memory cache with sliding TTL expiration, a background janitor
//! and optional write-through to a backing store.

mod builder;
mod engine;
mod entry;
mod snapshot;
mod stats;

#[cfg(test)]
mod property_tests;

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

// Re-export public types
pub use engine::Cache;
pub use builder::CacheBuilder;
pub use entry::Container;
pub use stats::CacheStats;

pub(crate) use engine::{Persistence, Shared, WeakCache};

/// Hook run on a value when the cache lets go of it (delete or eviction).
pub type ReleaseHook<V> = Arc<dyn Fn(&V) -> anyhow::Result<()> + Send + Sync>;

/// Bounds every cache key satisfies.
pub trait CacheKey: Eq + Hash + Clone + Debug + Send + Sync + 'static {}

impl<T> CacheKey for T where T: Eq + Hash + Clone + Debug + Send + Sync + 'static {}

/// Bounds every cached value satisfies.
pub trait CacheValue: Clone + Send + Sync + 'static {}

impl<T> CacheValue for T where T: Clone + Send + Sync + 'static {}
