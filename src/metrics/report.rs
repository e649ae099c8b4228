//! Human-readable cache effectiveness report.

use super::collector::MetricsCollector;
use super::snapshot::{MetricsOutcome, MetricsSnapshot};
use crate::backend::CacheBackend;
use std::fmt;

/// Direction of the hit ratio between the oldest retained snapshot and now.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trend {
    Improving,
    Declining,
}

impl Trend {
    /// `Improving` only when `new` is strictly greater; ties are `Declining`.
    pub fn between(old: f64, new: f64) -> Self {
        if new > old {
            Trend::Improving
        } else {
            Trend::Declining
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Improving => write!(f, "improving"),
            Trend::Declining => write!(f, "declining"),
        }
    }
}

/// Builds reports from a fresh collection plus the stored history.
#[derive(Clone)]
pub struct ReportGenerator<B: CacheBackend> {
    collector: MetricsCollector<B>,
}

impl<B: CacheBackend> ReportGenerator<B> {
    pub fn new(collector: MetricsCollector<B>) -> Self {
        ReportGenerator { collector }
    }

    pub fn collector(&self) -> &MetricsCollector<B> {
        &self.collector
    }

    /// Collect metrics and render the report.
    ///
    /// A degraded collection yields a one-line error message and the history
    /// is not read.
    pub async fn build_report(&self) -> String {
        match self.collector.collect_metrics().await {
            MetricsOutcome::Degraded(degraded) => {
                format!("Error generating report: {}", degraded.error)
            }
            MetricsOutcome::Healthy(snapshot) => {
                let history = self.collector.history().read().await;
                render_report(&snapshot, &history)
            }
        }
    }
}

/// Render a report for `snapshot`.
///
/// `history` is expected oldest first and, when produced by
/// [`ReportGenerator::build_report`], already contains `snapshot` at its end.
/// The trend line appears only with two or more history entries and compares
/// the first of them with `snapshot`.
pub fn render_report(snapshot: &MetricsSnapshot, history: &[MetricsSnapshot]) -> String {
    let mut report = format!(
        "CACHE EFFECTIVENESS REPORT\n\
         Generated: {}\n\
         \n\
         CURRENT PERFORMANCE\n\
         -------------------\n\
         Hit Ratio: {:.2}%\n\
         Total Requests: {}\n\
         Cache Keys: {}\n\
         Operations/sec: {}\n\
         \n\
         MEMORY USAGE\n\
         ------------\n\
         Used: {}\n\
         Peak: {}\n\
         Fragmentation Ratio: {:.2}\n\
         \n\
         EVICTION STATS\n\
         --------------\n\
         Evicted Keys: {}\n\
         Eviction Rate: {:.2}/sec\n\
         \n\
         ANALYSIS\n\
         --------\n\
         {}\n",
        snapshot.timestamp.to_rfc3339(),
        snapshot.cache_stats.hit_ratio,
        snapshot.cache_stats.total_requests,
        snapshot.keyspace_stats.total_keys,
        snapshot.performance_stats.instantaneous_ops_per_sec,
        snapshot.memory_stats.used_memory,
        snapshot.memory_stats.used_memory_peak,
        snapshot.memory_stats.mem_fragmentation_ratio,
        snapshot.keyspace_stats.evicted_keys,
        snapshot.keyspace_stats.eviction_rate_per_sec,
        snapshot.analysis,
    );

    if let Some(warning) = &snapshot.warning {
        report.push_str(&format!("\nWARNING: {}\n", warning));
    }

    if let [oldest, _, ..] = history {
        let old = oldest.hit_ratio();
        let new = snapshot.hit_ratio();
        report.push_str(&format!(
            "\nTREND: Cache effectiveness is {} ({:.2}% → {:.2}%)\n",
            Trend::between(old, new),
            old,
            new
        ));
    }

    report
}
