//! Bounded rolling log of metrics snapshots, kept in the backend itself.

use super::snapshot::MetricsSnapshot;
use crate::backend::CacheBackend;
use crate::config::CacheConfig;
use crate::error::{Error, Result};
use crate::serialization::{decode, encode};
use std::time::Duration;

/// Result of one append. History is best effort; a failure is reported here
/// and logged, never raised.
#[derive(Clone, Debug)]
pub enum HistoryAppend {
    Stored {
        /// History length after the append.
        len: usize,
    },
    Failed(Error),
}

impl HistoryAppend {
    pub fn is_stored(&self) -> bool {
        matches!(self, HistoryAppend::Stored { .. })
    }
}

/// Snapshot history, oldest first, stored under a single key.
///
/// Every append rewrites the whole sequence and refreshes the key's TTL.
/// Concurrent appends can lose one another's entry (last write wins).
#[derive(Clone)]
pub struct MetricsHistory<B: CacheBackend> {
    backend: B,
    key: String,
    ttl: Duration,
    capacity: usize,
}

impl<B: CacheBackend> MetricsHistory<B> {
    pub fn new(backend: B, config: &CacheConfig) -> Self {
        MetricsHistory {
            backend,
            key: config.history_key.clone(),
            ttl: config.history_ttl,
            capacity: config.history_capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a snapshot, dropping the oldest entries beyond capacity.
    pub async fn append(&self, snapshot: &MetricsSnapshot) -> HistoryAppend {
        match self.try_append(snapshot).await {
            Ok(len) => {
                debug!("Metrics history {} now holds {} entries", self.key, len);
                HistoryAppend::Stored { len }
            }
            Err(e) => {
                error!("Error storing metrics history: {}", e);
                HistoryAppend::Failed(e)
            }
        }
    }

    /// Current history, or empty if absent, expired or unreadable.
    pub async fn read(&self) -> Vec<MetricsSnapshot> {
        match self.load().await {
            Ok(history) => history,
            Err(e) => {
                warn!("Error reading metrics history: {}", e);
                Vec::new()
            }
        }
    }

    async fn try_append(&self, snapshot: &MetricsSnapshot) -> Result<usize> {
        let mut history = self.load().await?;
        history.push(snapshot.clone());
        if history.len() > self.capacity {
            let excess = history.len() - self.capacity;
            history.drain(..excess);
        }

        let bytes = encode(&history)?;
        self.backend.set(&self.key, bytes, Some(self.ttl)).await?;
        Ok(history.len())
    }

    /// Backend errors propagate; an entry that does not decode reads as empty
    /// and is overwritten by the next append.
    async fn load(&self) -> Result<Vec<MetricsSnapshot>> {
        match self.backend.get(&self.key).await? {
            None => Ok(Vec::new()),
            Some(bytes) => match decode::<Vec<MetricsSnapshot>>(&bytes) {
                Ok(history) => Ok(history),
                Err(e) => {
                    warn!("Discarding undecodable metrics history {}: {}", self.key, e);
                    Ok(Vec::new())
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendInfo, InMemoryBackend};
    use chrono::Utc;

    fn snapshot(hits: u64, misses: u64) -> MetricsSnapshot {
        let info = BackendInfo::new()
            .with("keyspace_hits", hits)
            .with("keyspace_misses", misses);
        MetricsSnapshot::derive(&info, 0, Utc::now()).unwrap()
    }

    #[derive(Clone)]
    struct ReadOnlyBackend(InMemoryBackend);

    impl CacheBackend for ReadOnlyBackend {
        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
            self.0.get(key).await
        }

        async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Option<Duration>) -> Result<()> {
            Err(Error::BackendError("READONLY".to_string()))
        }

        async fn delete(&self, key: &str) -> Result<()> {
            self.0.delete(key).await
        }
    }

    #[tokio::test]
    async fn test_read_absent_is_empty() {
        let history = MetricsHistory::new(InMemoryBackend::new(), &CacheConfig::default());
        assert!(history.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_append_keeps_order_and_sets_ttl() {
        let backend = InMemoryBackend::new();
        let history = MetricsHistory::new(backend.clone(), &CacheConfig::default());

        assert!(matches!(
            history.append(&snapshot(6, 4)).await,
            HistoryAppend::Stored { len: 1 }
        ));
        assert!(matches!(
            history.append(&snapshot(8, 2)).await,
            HistoryAppend::Stored { len: 2 }
        ));

        let ratios: Vec<f64> = history.read().await.iter().map(|s| s.hit_ratio()).collect();
        assert_eq!(ratios, vec![60.0, 80.0]);

        let ttl = backend
            .ttl("cache_metrics_history")
            .await
            .unwrap()
            .expect("history has ttl");
        assert!(ttl > Duration::from_secs(86_390));
    }

    #[tokio::test]
    async fn test_capacity_drops_oldest() {
        let config = CacheConfig::default().with_history_capacity(3);
        let history = MetricsHistory::new(InMemoryBackend::new(), &config);

        for hits in 1..=5 {
            history.append(&snapshot(hits, 10 - hits)).await;
        }

        let hits: Vec<u64> = history
            .read()
            .await
            .iter()
            .map(|s| s.cache_stats.hits)
            .collect();
        assert_eq!(hits, vec![3, 4, 5]);
    }

    #[tokio::test]
    async fn test_persistence_failure_is_reported_not_raised() {
        let history = MetricsHistory::new(
            ReadOnlyBackend(InMemoryBackend::new()),
            &CacheConfig::default(),
        );

        match history.append(&snapshot(1, 1)).await {
            HistoryAppend::Failed(Error::BackendError(msg)) => assert_eq!(msg, "READONLY"),
            other => panic!("Expected Failed, got {:?}", other),
        }
        assert!(history.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_history_is_replaced() {
        let backend = InMemoryBackend::new();
        backend
            .set("cache_metrics_history", b"{not postcard".to_vec(), None)
            .await
            .unwrap();
        let history = MetricsHistory::new(backend, &CacheConfig::default());

        assert!(history.read().await.is_empty());
        assert!(matches!(
            history.append(&snapshot(1, 0)).await,
            HistoryAppend::Stored { len: 1 }
        ));
    }
}
