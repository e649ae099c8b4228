//! Reads backend counters and turns them into a [`MetricsOutcome`].

use super::history::{HistoryAppend, MetricsHistory};
use super::snapshot::{DegradedMetrics, MetricsOutcome, MetricsSnapshot};
use crate::backend::CacheBackend;
use crate::config::CacheConfig;
use crate::error::Result;
use chrono::Utc;

/// On-demand metrics collection.
///
/// Each call queries the backend's introspection interface once and lists
/// its keys once. Successful snapshots are appended to the history before
/// being returned; failures come back as [`MetricsOutcome::Degraded`] and
/// leave the history untouched.
///
/// # Example
///
/// ```ignore
/// let collector = MetricsCollector::new(backend.clone(), &CacheConfig::default());
///
/// match collector.collect_metrics().await {
///     MetricsOutcome::Healthy(snapshot) => println!("{}", snapshot.analysis),
///     MetricsOutcome::Degraded(degraded) => eprintln!("{}", degraded.error),
/// }
/// ```
#[derive(Clone)]
pub struct MetricsCollector<B: CacheBackend> {
    backend: B,
    history: MetricsHistory<B>,
}

impl<B: CacheBackend> MetricsCollector<B> {
    pub fn new(backend: B, config: &CacheConfig) -> Self {
        MetricsCollector {
            history: MetricsHistory::new(backend.clone(), config),
            backend,
        }
    }

    pub fn history(&self) -> &MetricsHistory<B> {
        &self.history
    }

    /// Collect, analyze and record one snapshot. Never fails.
    pub async fn collect_metrics(&self) -> MetricsOutcome {
        match self.snapshot().await {
            Ok(snapshot) => {
                snapshot.log_summary();
                if let HistoryAppend::Failed(e) = self.history.append(&snapshot).await {
                    debug!("Snapshot returned without history entry: {}", e);
                }
                MetricsOutcome::Healthy(snapshot)
            }
            Err(e) => {
                error!("Error getting cache metrics: {}", e);
                MetricsOutcome::Degraded(DegradedMetrics::new(e))
            }
        }
    }

    async fn snapshot(&self) -> Result<MetricsSnapshot> {
        let info = self.backend.info().await?;
        let total_keys = self.backend.keys("*").await?.len() as u64;
        MetricsSnapshot::derive(&info, total_keys, Utc::now())
    }
}
