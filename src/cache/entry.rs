//! Cache Entry Module
//!
//! Defines the container holding one cached value and its deadline.

use std::time::Duration;

use parking_lot::RwLock;
use tokio::time::Instant;

// == Slot ==
#[derive(Debug)]
struct Slot<V> {
    value: V,
    deadline: Option<Instant>,
}

/// now + ttl, or no deadline when the sum is past what an Instant can hold.
fn deadline_after(ttl: Option<Duration>) -> Option<Instant> {
    ttl.and_then(|ttl| Instant::now().checked_add(ttl))
}

// == Container ==
/// Holds a single cached value together with its expiration deadline.
///
/// Each container carries its own lock, separate from the cache's map lock,
/// so a value can be updated while other tasks enumerate keys. The deadline
/// sits behind the same lock as the value: it is never read or written
/// without it.
#[derive(Debug)]
pub struct Container<V> {
    slot: RwLock<Slot<V>>,
}

impl<V: Clone> Container<V> {
    // == Constructor ==
    /// Creates a new container with an optional TTL.
    ///
    /// # Arguments
    /// * `value` - The value to hold
    /// * `ttl` - Optional TTL, None = never expires
    pub fn new(value: V, ttl: Option<Duration>) -> Self {
        Self {
            slot: RwLock::new(Slot {
                value,
                deadline: deadline_after(ttl),
            }),
        }
    }

    // == Load ==
    /// Returns a clone of the current value (shared lock).
    pub fn load(&self) -> V {
        self.slot.read().value.clone()
    }

    // == Store ==
    /// Replaces the value (exclusive lock).
    pub fn store(&self, value: V) {
        self.slot.write().value = value;
    }

    /// Replaces the value and returns the previous one.
    pub fn replace(&self, value: V) -> V {
        std::mem::replace(&mut self.slot.write().value, value)
    }

    /// Consumes the container, returning its value.
    pub fn into_inner(self) -> V {
        self.slot.into_inner().value
    }
}

impl<V> Container<V> {
    // == Deadline ==
    /// Sets the deadline explicitly (exclusive lock).
    pub fn update_deadline(&self, deadline: Option<Instant>) {
        self.slot.write().deadline = deadline;
    }

    /// Pushes the deadline to now + ttl. A None ttl leaves the entry without expiry.
    pub fn touch(&self, ttl: Option<Duration>) {
        self.update_deadline(deadline_after(ttl));
    }

    /// Returns the current deadline.
    pub fn deadline(&self) -> Option<Instant> {
        self.slot.read().deadline
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time is strictly past its
    /// deadline. Entries without a deadline never expire.
    pub fn is_expired(&self) -> bool {
        self.expired_at(Instant::now())
    }

    /// Checks expiry against a fixed reference time, used by sweeps.
    pub fn expired_at(&self, now: Instant) -> bool {
        match self.slot.read().deadline {
            Some(deadline) => now > deadline,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns the remaining TTL, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(Duration::ZERO)` if the deadline has passed
    /// - `Some(remaining)` if the entry is still live
    /// - `None` if the entry never expires
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.deadline()
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_no_ttl() {
        let container = Container::new("value".to_string(), None);

        assert_eq!(container.load(), "value");
        assert!(container.deadline().is_none());
        assert!(!container.is_expired());
        assert!(container.ttl_remaining().is_none());
    }

    #[test]
    fn test_container_store_replaces_value() {
        let container = Container::new(1u32, None);
        container.store(2);
        assert_eq!(container.load(), 2);
        assert_eq!(container.replace(3), 2);
        assert_eq!(container.into_inner(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_container_expiration() {
        let container = Container::new("value", Some(Duration::from_secs(1)));
        assert!(!container.is_expired());

        tokio::time::advance(Duration::from_millis(1100)).await;

        assert!(container.is_expired());
        assert_eq!(container.ttl_remaining(), Some(Duration::ZERO));
    }

    #[tokio::test(start_paused = true)]
    async fn test_touch_extends_deadline() {
        let container = Container::new("value", Some(Duration::from_secs(1)));

        tokio::time::advance(Duration::from_millis(800)).await;
        container.touch(Some(Duration::from_secs(1)));
        tokio::time::advance(Duration::from_millis(800)).await;

        assert!(!container.is_expired());
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = Instant::now();
        let container = Container::new("value", None);
        container.update_deadline(Some(now));

        // exactly at the deadline is still live; strictly after is expired
        assert!(!container.expired_at(now));
        assert!(container.expired_at(now + Duration::from_nanos(1)));
    }

    #[test]
    fn test_ttl_remaining_within_bounds() {
        let container = Container::new("value", Some(Duration::from_secs(10)));
        let remaining = container.ttl_remaining().unwrap();
        assert!(remaining <= Duration::from_secs(10));
        assert!(remaining >= Duration::from_secs(9));
    }

    #[test]
    fn test_unrepresentable_ttl_never_expires() {
        let container = Container::new("value", Some(Duration::MAX));
        assert!(container.deadline().is_none());
        assert!(!container.is_expired());

        container.touch(Some(Duration::MAX));
        assert!(container.ttl_remaining().is_none());
    }
}
