//! Snapshot Encoding Module
//!
//! JSON and YAML encoding of a cache's current key-value snapshot.
//!
//! Only keys and values are encoded. Deadlines are not part of the format,
//! so a decoded cache starts with fresh TTLs.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::{Cache, CacheKey, CacheValue};
use crate::error::Result;

impl<K, V> Cache<K, V>
where
    K: CacheKey + Serialize + DeserializeOwned,
    V: CacheValue + Serialize + DeserializeOwned,
{
    /// Encodes the current snapshot as a JSON object.
    pub async fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.copy().await)?)
    }

    /// Builds a cache without TTL or store from a JSON object.
    pub fn from_json(input: &str) -> Result<Self> {
        let entries: HashMap<K, V> = serde_json::from_str(input)?;
        Ok(Self::from_map(entries))
    }

    /// Encodes the current snapshot as a YAML mapping.
    pub async fn to_yaml(&self) -> Result<String> {
        Ok(serde_yml::to_string(&self.copy().await)?)
    }

    /// Builds a cache without TTL or store from a YAML mapping.
    pub fn from_yaml(input: &str) -> Result<Self> {
        let entries: HashMap<K, V> = serde_yml::from_str(input)?;
        Ok(Self::from_map(entries))
    }
}
