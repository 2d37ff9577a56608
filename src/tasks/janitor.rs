//! TTL Janitor Task
//!
//! Background task that periodically evicts expired cache entries.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cache::{CacheKey, CacheValue, WeakCache};

/// Spawns a background task that periodically evicts expired entries.
///
/// The task sleeps for `interval` between sweeps. Each sweep is a full scan
/// of the cache (see [`Cache::evict_expired`](crate::Cache::evict_expired)).
/// It holds only a weak reference, so it never keeps the cache alive.
///
/// # Arguments
/// * `cache` - Weak handle to the cache being swept
/// * `interval` - Sleep between sweeps
/// * `cancel` - Token that stops the task
///
/// # Returns
/// A JoinHandle for the spawned task, awaited on shutdown.
pub(crate) fn spawn_janitor_task<K, V>(
    cache: WeakCache<K, V>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()>
where
    K: CacheKey,
    V: CacheValue,
{
    tokio::spawn(async move {
        info!(
            "Starting TTL janitor task with interval of {:?}",
            interval
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }

            let Some(cache) = cache.upgrade() else {
                break;
            };
            let removed = cache.evict_expired().await;
            drop(cache);

            if removed > 0 {
                info!("TTL janitor: evicted {} expired entries", removed);
            } else {
                debug!("TTL janitor: no expired entries found");
            }
        }

        info!("TTL janitor task stopped");
    })
}

#[cfg(test)]
mod tests {
    use crate::Cache;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_janitor_removes_expired_entries() {
        let cache = Cache::builder()
            .expiration(Duration::from_secs(1))
            .sweep_floor(Duration::from_secs(1))
            .build();
        cache.set("expire_soon", "value").await.unwrap();

        tokio::time::sleep(Duration::from_millis(2500)).await;

        assert!(
            cache.get(&"expire_soon").await.is_err(),
            "Expired entry should have been evicted"
        );
        cache.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_janitor_preserves_valid_entries() {
        let cache = Cache::builder()
            .expiration(Duration::from_secs(3600))
            .sweep_floor(Duration::from_secs(1))
            .build();
        cache.set("long_lived", "value").await.unwrap();

        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(cache.get(&"long_lived").await.unwrap(), "value");
        cache.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_janitor_stops_when_cache_dropped() {
        let cache: Cache<String, String> = Cache::builder()
            .expiration(Duration::from_secs(1))
            .sweep_floor(Duration::from_secs(1))
            .build();
        let weak = cache.downgrade();
        drop(cache);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(weak.upgrade().is_none());
    }
}
