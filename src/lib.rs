//! TTL Cache - A generic in-process key-value cache
//!
//! Provides sliding TTL expiration swept by a background janitor, optional
//! write-through to a backing store serialized by a single writer task, and
//! typed queries for filtering cached values.

pub mod cache;
pub mod config;
pub mod error;
pub mod persistence;
pub mod query;
pub mod tasks;

pub use cache::{Cache, CacheBuilder, CacheStats};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use persistence::{MemoryStore, Store};
pub use query::{Comparator, FieldMatcher, Fields, Matcher, Query, Value};
