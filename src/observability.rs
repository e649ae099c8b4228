//! Client-side hooks for cache events.
//!
//! The accessor and the invalidation listener report every hit, miss,
//! store, delete and error through a [`CacheMetrics`] implementation.
//! These are the events this process observed; the backend's own counters
//! (which include every other client) are read separately by
//! [`crate::metrics::MetricsCollector`].
//!
//! ```
//! use property_cache::observability::{CacheMetrics, CountingMetrics};
//! use std::time::Duration;
//!
//! let metrics = CountingMetrics::new();
//! metrics.record_hit("all_properties", Duration::from_micros(40));
//! metrics.record_miss("all_properties", Duration::from_micros(900));
//! assert_eq!(metrics.hits(), 1);
//! assert_eq!(metrics.hit_rate(), 0.5);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Trait for cache event recording.
///
/// Default methods log at `debug`/`warn`.
pub trait CacheMetrics: Send + Sync {
    /// Record a cache hit.
    fn record_hit(&self, key: &str, duration: Duration) {
        debug!("Cache HIT: {} took {:?}", key, duration);
    }

    /// Record a cache miss.
    fn record_miss(&self, key: &str, duration: Duration) {
        debug!("Cache MISS: {} took {:?}", key, duration);
    }

    /// Record a cache set operation.
    fn record_set(&self, key: &str, duration: Duration) {
        debug!("Cache SET: {} took {:?}", key, duration);
    }

    /// Record a cache delete operation.
    fn record_delete(&self, key: &str, duration: Duration) {
        debug!("Cache DELETE: {} took {:?}", key, duration);
    }

    /// Record an error.
    fn record_error(&self, key: &str, error: &str) {
        warn!("Cache ERROR for {}: {}", key, error);
    }
}

/// Default metrics implementation (no-op).
#[derive(Clone, Default)]
pub struct NoOpMetrics;

impl CacheMetrics for NoOpMetrics {
    fn record_hit(&self, _key: &str, _duration: Duration) {}
    fn record_miss(&self, _key: &str, _duration: Duration) {}
    fn record_set(&self, _key: &str, _duration: Duration) {}
    fn record_delete(&self, _key: &str, _duration: Duration) {}
    fn record_error(&self, _key: &str, _error: &str) {}
}

/// Atomic counters for every event kind. Clones share counters.
#[derive(Clone, Default)]
pub struct CountingMetrics {
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
    sets: Arc<AtomicU64>,
    deletes: Arc<AtomicU64>,
    errors: Arc<AtomicU64>,
}

impl CountingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn sets(&self) -> u64 {
        self.sets.load(Ordering::Relaxed)
    }

    pub fn deletes(&self) -> u64 {
        self.deletes.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Hit rate (0.0 to 1.0) over the events seen so far.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits() as f64;
        let total = hits + self.misses() as f64;
        if total == 0.0 {
            return 0.0;
        }
        hits / total
    }
}

impl CacheMetrics for CountingMetrics {
    fn record_hit(&self, key: &str, duration: Duration) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        debug!("Cache HIT: {} took {:?}", key, duration);
    }

    fn record_miss(&self, key: &str, duration: Duration) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!("Cache MISS: {} took {:?}", key, duration);
    }

    fn record_set(&self, _key: &str, _duration: Duration) {
        self.sets.fetch_add(1, Ordering::Relaxed);
    }

    fn record_delete(&self, _key: &str, _duration: Duration) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    fn record_error(&self, key: &str, error: &str) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        warn!("Cache ERROR for {}: {}", key, error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_metrics() {
        let metrics = NoOpMetrics;
        metrics.record_hit("key", Duration::from_secs(1));
        metrics.record_miss("key", Duration::from_secs(2));
        metrics.record_error("key", "boom");
    }

    #[test]
    fn test_counting_metrics() {
        let metrics = CountingMetrics::new();
        let shared = metrics.clone();

        shared.record_hit("k", Duration::ZERO);
        shared.record_hit("k", Duration::ZERO);
        shared.record_miss("k", Duration::ZERO);
        shared.record_set("k", Duration::ZERO);
        shared.record_delete("k", Duration::ZERO);
        shared.record_error("k", "boom");

        assert_eq!(metrics.hits(), 2);
        assert_eq!(metrics.misses(), 1);
        assert_eq!(metrics.sets(), 1);
        assert_eq!(metrics.deletes(), 1);
        assert_eq!(metrics.errors(), 1);
        assert!((metrics.hit_rate() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_hit_rate_empty() {
        assert_eq!(CountingMetrics::new().hit_rate(), 0.0);
    }
}
