//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache and persistence operations.
///
/// A query evaluated against a value of the wrong kind is not an error: it is
/// simply a non-match, so no variant exists for it.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found in memory or in the backing store
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Opaque failure reported by the backing store
    #[error("Store error: {0}")]
    Store(#[source] anyhow::Error),

    /// The writer task has shut down and no longer accepts actions
    #[error("Writer closed: the cache has been shut down")]
    WriterClosed,

    /// Snapshot encoding or decoding failed
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CacheError {
    /// Builds a `NotFound` error from any printable key.
    pub fn not_found<K: std::fmt::Debug>(key: &K) -> Self {
        CacheError::NotFound(format!("{:?}", key))
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}

impl From<serde_yml::Error> for CacheError {
    fn from(err: serde_yml::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
