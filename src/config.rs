//! Configuration Module
//!
//! Handles loading cache configuration from environment variables.

use std::env;
use std::time::Duration;

use tracing::warn;

/// Minimum janitor sleep for caches without a backing store.
pub const MEMORY_SWEEP_FLOOR: Duration = Duration::from_secs(30);

/// Minimum janitor sleep for caches with a backing store.
pub const PERSISTENT_SWEEP_FLOOR: Duration = Duration::from_secs(3);

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Sliding TTL applied to every entry, None = entries never expire
    pub default_ttl: Option<Duration>,
    /// Overrides the janitor sweep floor, None = pick by persistence mode
    pub sweep_floor: Option<Duration>,
    /// Await the store result of every mutation and surface its error
    pub wait_for_store: bool,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DEFAULT_TTL` - TTL in seconds, 0 disables expiry (default: 0)
    /// - `CACHE_SWEEP_FLOOR` - Janitor floor in seconds (default: by mode)
    /// - `CACHE_WAIT_FOR_STORE` - `true`/`false`, `1`/`0`, `yes`/`no`, `on`/`off` (default: false)
    ///
    /// Unparsable values are logged and replaced by the default.
    pub fn from_env() -> Self {
        let default_ttl = env_seconds("CACHE_DEFAULT_TTL")
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);
        let sweep_floor = env_seconds("CACHE_SWEEP_FLOOR").map(Duration::from_secs);
        let wait_for_store = env::var("CACHE_WAIT_FOR_STORE")
            .ok()
            .and_then(|v| {
                let flag = parse_flag(&v);
                if flag.is_none() {
                    warn!("Ignoring CACHE_WAIT_FOR_STORE={:?}: not a boolean", v);
                }
                flag
            })
            .unwrap_or(false);

        Self {
            default_ttl,
            sweep_floor,
            wait_for_store,
        }
    }

    /// Returns the janitor sleep interval: max(ttl, floor).
    pub fn sweep_interval(&self, persistent: bool) -> Duration {
        let floor = self.sweep_floor.unwrap_or(if persistent {
            PERSISTENT_SWEEP_FLOOR
        } else {
            MEMORY_SWEEP_FLOOR
        });
        match self.default_ttl {
            Some(ttl) if ttl > floor => ttl,
            _ => floor,
        }
    }
}

fn env_seconds(name: &str) -> Option<u64> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse::<u64>() {
        Ok(secs) => Some(secs),
        Err(err) => {
            warn!("Ignoring {}={:?}: {}", name, raw, err);
            None
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: None,
            sweep_floor: None,
            wait_for_store: false,
        }
    }
}
