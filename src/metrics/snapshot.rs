//! Metrics snapshot types and the derivation from raw backend counters.

use crate::backend::BackendInfo;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fragmentation ratio above which a memory warning is attached.
pub const FRAGMENTATION_WARNING_THRESHOLD: f64 = 1.5;

pub const FRAGMENTATION_WARNING: &str =
    "High memory fragmentation detected. Consider restarting Redis.";

/// Qualitative cache effectiveness, banded by hit ratio.
///
/// Bands use strict `>` comparisons, so a ratio sitting exactly on a
/// threshold falls into the band below it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effectiveness {
    /// Hit ratio above 90%.
    Excellent,
    /// Hit ratio above 70%.
    Good,
    /// Hit ratio above 50%.
    Moderate,
    /// Everything else.
    Low,
}

impl Effectiveness {
    /// Classify a hit ratio expressed in percent.
    ///
    /// ```
    /// use property_cache::metrics::Effectiveness;
    ///
    /// assert_eq!(Effectiveness::classify(90.0), Effectiveness::Good);
    /// assert_eq!(Effectiveness::classify(90.01), Effectiveness::Excellent);
    /// assert_eq!(Effectiveness::classify(50.0), Effectiveness::Low);
    /// ```
    pub fn classify(hit_ratio: f64) -> Self {
        if hit_ratio > 90.0 {
            Effectiveness::Excellent
        } else if hit_ratio > 70.0 {
            Effectiveness::Good
        } else if hit_ratio > 50.0 {
            Effectiveness::Moderate
        } else {
            Effectiveness::Low
        }
    }

    /// Advice shown in logs, reports and the JSON view.
    pub fn message(&self) -> &'static str {
        match self {
            Effectiveness::Excellent => "Excellent cache hit ratio! Cache is very effective.",
            Effectiveness::Good => "Good cache hit ratio. Consider fine-tuning cache strategies.",
            Effectiveness::Moderate => {
                "Moderate cache hit ratio. Review cache invalidation and TTL settings."
            }
            Effectiveness::Low => {
                "Low cache hit ratio. Consider increasing cache duration or reviewing cache keys."
            }
        }
    }
}

impl fmt::Display for Effectiveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effectiveness::Excellent => write!(f, "excellent"),
            Effectiveness::Good => write!(f, "good"),
            Effectiveness::Moderate => write!(f, "moderate"),
            Effectiveness::Low => write!(f, "low"),
        }
    }
}

/// Keyspace lookup counters and the ratios derived from them.
///
/// `hits + misses == total_requests`. When `total_requests > 0` the two
/// ratios add up to 100 (within rounding); otherwise both are 0.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub total_requests: u64,
    /// Percent, rounded to 2 decimals.
    pub hit_ratio: f64,
    /// Percent, rounded to 2 decimals.
    pub miss_ratio: f64,
}

impl CacheStats {
    pub fn new(hits: u64, misses: u64) -> Self {
        let total_requests = hits.saturating_add(misses);
        let (hit_ratio, miss_ratio) = match exact_hit_ratio(hits, misses) {
            Some(ratio) => (round2(ratio), round2(100.0 - ratio)),
            None => (0.0, 0.0),
        };
        CacheStats {
            hits,
            misses,
            total_requests,
            hit_ratio,
            miss_ratio,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemoryStats {
    pub used_memory: String,
    pub used_memory_peak: String,
    pub used_memory_rss: String,
    pub mem_fragmentation_ratio: f64,
    pub maxmemory: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyspaceStats {
    pub total_keys: u64,
    pub expired_keys: u64,
    pub evicted_keys: u64,
    pub eviction_rate_per_sec: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClientStats {
    pub connected_clients: u64,
    pub blocked_clients: u64,
    pub client_longest_output_list: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStats {
    pub instantaneous_ops_per_sec: u64,
    pub instantaneous_input_kbps: f64,
    pub instantaneous_output_kbps: f64,
    pub total_commands_processed: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReplicationStats {
    pub role: String,
    pub connected_slaves: u64,
}

/// One successful metrics collection. Immutable once built.
///
/// Stored in the history with the postcard envelope, so every field is
/// always serialized (no skipped options).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub cache_stats: CacheStats,
    pub memory_stats: MemoryStats,
    pub keyspace_stats: KeyspaceStats,
    pub client_stats: ClientStats,
    pub performance_stats: PerformanceStats,
    pub replication_stats: ReplicationStats,
    pub effectiveness: Effectiveness,
    pub analysis: String,
    pub warning: Option<String>,
}

impl MetricsSnapshot {
    /// Derive a snapshot from one introspection response.
    ///
    /// Missing counters default to 0 and missing human-readable fields to
    /// `"N/A"`; a missing uptime counts as one second. Classification uses
    /// the unrounded hit ratio.
    ///
    /// # Errors
    /// Returns `Error::MalformedInfo` if a numeric field does not parse.
    pub fn derive(info: &BackendInfo, total_keys: u64, timestamp: DateTime<Utc>) -> Result<Self> {
        let hits = info.get_u64("keyspace_hits")?;
        let misses = info.get_u64("keyspace_misses")?;
        let cache_stats = CacheStats::new(hits, misses);
        let effectiveness = Effectiveness::classify(exact_hit_ratio(hits, misses).unwrap_or(0.0));

        let fragmentation = info.get_f64("mem_fragmentation_ratio")?;
        let evicted_keys = info.get_u64("evicted_keys")?;
        let uptime = info.get_u64_or("uptime_in_seconds", 1)?;
        let eviction_rate = if uptime > 0 {
            evicted_keys as f64 / uptime as f64
        } else {
            0.0
        };

        let warning = (fragmentation > FRAGMENTATION_WARNING_THRESHOLD)
            .then(|| FRAGMENTATION_WARNING.to_string());

        Ok(MetricsSnapshot {
            timestamp,
            cache_stats,
            memory_stats: MemoryStats {
                used_memory: info.get_str("used_memory_human"),
                used_memory_peak: info.get_str("used_memory_peak_human"),
                used_memory_rss: info.get_str("used_memory_rss_human"),
                mem_fragmentation_ratio: round2(fragmentation),
                maxmemory: info.get_str("maxmemory_human"),
            },
            keyspace_stats: KeyspaceStats {
                total_keys,
                expired_keys: info.get_u64("expired_keys")?,
                evicted_keys,
                eviction_rate_per_sec: round2(eviction_rate),
            },
            client_stats: ClientStats {
                connected_clients: info.get_u64("connected_clients")?,
                blocked_clients: info.get_u64("blocked_clients")?,
                client_longest_output_list: info.get_u64("client_longest_output_list")?,
            },
            performance_stats: PerformanceStats {
                instantaneous_ops_per_sec: info.get_u64("instantaneous_ops_per_sec")?,
                instantaneous_input_kbps: info.get_f64("instantaneous_input_kbps")?,
                instantaneous_output_kbps: info.get_f64("instantaneous_output_kbps")?,
                total_commands_processed: info.get_u64("total_commands_processed")?,
            },
            replication_stats: ReplicationStats {
                role: info.get_str("role"),
                connected_slaves: info.get_u64("connected_slaves")?,
            },
            effectiveness,
            analysis: effectiveness.message().to_string(),
            warning,
        })
    }

    pub fn hit_ratio(&self) -> f64 {
        self.cache_stats.hit_ratio
    }

    /// Emit the summary block at `info`.
    pub fn log_summary(&self) {
        info!("=== Cache Metrics Analysis ===");
        info!(
            "Cache Hit Ratio: {:.2}% (Hits: {}, Misses: {})",
            self.cache_stats.hit_ratio, self.cache_stats.hits, self.cache_stats.misses
        );
        info!("Memory Usage: {}", self.memory_stats.used_memory);
        info!("Total Cache Keys: {}", self.keyspace_stats.total_keys);
        info!(
            "Operations/sec: {}",
            self.performance_stats.instantaneous_ops_per_sec
        );
        info!("Analysis: {}", self.analysis);
        if let Some(warning) = &self.warning {
            warn!("{}", warning);
        }
    }
}

/// Minimal view returned when the backend could not be read.
///
/// Never appended to history and never analyzed.
#[derive(Clone, Debug, Serialize)]
pub struct DegradedMetrics {
    pub timestamp: DateTime<Utc>,
    pub cache_stats: CacheStats,
    /// Human-readable failure description.
    pub error: String,
    #[serde(skip)]
    pub source: Error,
}

impl DegradedMetrics {
    pub fn new(source: Error) -> Self {
        DegradedMetrics {
            timestamp: Utc::now(),
            cache_stats: CacheStats::default(),
            error: source.to_string(),
            source,
        }
    }
}

/// Result of a metrics collection. Serializes as the bare snapshot or the
/// bare degraded view, so a JSON consumer checks for the `error` field.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum MetricsOutcome {
    Healthy(MetricsSnapshot),
    Degraded(DegradedMetrics),
}

impl MetricsOutcome {
    pub fn is_healthy(&self) -> bool {
        matches!(self, MetricsOutcome::Healthy(_))
    }

    pub fn snapshot(&self) -> Option<&MetricsSnapshot> {
        match self {
            MetricsOutcome::Healthy(snapshot) => Some(snapshot),
            MetricsOutcome::Degraded(_) => None,
        }
    }

    /// The failure behind a degraded outcome.
    pub fn error(&self) -> Option<&Error> {
        match self {
            MetricsOutcome::Healthy(_) => None,
            MetricsOutcome::Degraded(degraded) => Some(&degraded.source),
        }
    }

    pub fn cache_stats(&self) -> &CacheStats {
        match self {
            MetricsOutcome::Healthy(snapshot) => &snapshot.cache_stats,
            MetricsOutcome::Degraded(degraded) => &degraded.cache_stats,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            MetricsOutcome::Healthy(snapshot) => snapshot.timestamp,
            MetricsOutcome::Degraded(degraded) => degraded.timestamp,
        }
    }
}

fn exact_hit_ratio(hits: u64, misses: u64) -> Option<f64> {
    let total = hits as f64 + misses as f64;
    (total > 0.0).then(|| hits as f64 * 100.0 / total)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::{decode, encode};

    fn info(hits: u64, misses: u64) -> BackendInfo {
        BackendInfo::new()
            .with("keyspace_hits", hits)
            .with("keyspace_misses", misses)
    }

    #[test]
    fn test_classification_boundaries() {
        assert_eq!(Effectiveness::classify(100.0), Effectiveness::Excellent);
        assert_eq!(Effectiveness::classify(90.0), Effectiveness::Good);
        assert_eq!(Effectiveness::classify(70.0), Effectiveness::Moderate);
        assert_eq!(Effectiveness::classify(50.0), Effectiveness::Low);
        assert_eq!(Effectiveness::classify(0.0), Effectiveness::Low);
    }

    #[test]
    fn test_derive_ninety_percent_is_good() {
        let snapshot = MetricsSnapshot::derive(&info(90, 10), 4, Utc::now()).unwrap();

        assert_eq!(snapshot.cache_stats.total_requests, 100);
        assert_eq!(snapshot.cache_stats.hit_ratio, 90.0);
        assert_eq!(snapshot.cache_stats.miss_ratio, 10.0);
        assert_eq!(snapshot.effectiveness, Effectiveness::Good);
        assert_eq!(
            snapshot.analysis,
            "Good cache hit ratio. Consider fine-tuning cache strategies."
        );
        assert_eq!(snapshot.keyspace_stats.total_keys, 4);
    }

    #[test]
    fn test_classification_uses_unrounded_ratio() {
        // 90.0001% rounds to 90.0 but is strictly above it.
        let snapshot = MetricsSnapshot::derive(&info(900_001, 99_999), 0, Utc::now()).unwrap();
        assert_eq!(snapshot.cache_stats.hit_ratio, 90.0);
        assert_eq!(snapshot.effectiveness, Effectiveness::Excellent);
    }

    #[test]
    fn test_derive_no_requests() {
        let snapshot = MetricsSnapshot::derive(&BackendInfo::new(), 0, Utc::now()).unwrap();

        assert_eq!(snapshot.cache_stats, CacheStats::default());
        assert_eq!(snapshot.effectiveness, Effectiveness::Low);
        assert_eq!(snapshot.memory_stats.used_memory, "N/A");
        assert_eq!(snapshot.replication_stats.role, "N/A");
        assert!(snapshot.warning.is_none());
    }

    #[test]
    fn test_ratios_rounded() {
        let stats = CacheStats::new(2, 1);
        assert_eq!(stats.hit_ratio, 66.67);
        assert_eq!(stats.miss_ratio, 33.33);
    }

    #[test]
    fn test_eviction_rate_and_uptime_default() {
        let with_uptime = info(1, 1)
            .with("evicted_keys", 30)
            .with("uptime_in_seconds", 7);
        let snapshot = MetricsSnapshot::derive(&with_uptime, 0, Utc::now()).unwrap();
        assert_eq!(snapshot.keyspace_stats.eviction_rate_per_sec, 4.29);

        let without_uptime = info(1, 1).with("evicted_keys", 3);
        let snapshot = MetricsSnapshot::derive(&without_uptime, 0, Utc::now()).unwrap();
        assert_eq!(snapshot.keyspace_stats.eviction_rate_per_sec, 3.0);

        let zero_uptime = info(1, 1)
            .with("evicted_keys", 3)
            .with("uptime_in_seconds", 0);
        let snapshot = MetricsSnapshot::derive(&zero_uptime, 0, Utc::now()).unwrap();
        assert_eq!(snapshot.keyspace_stats.eviction_rate_per_sec, 0.0);
    }

    #[test]
    fn test_fragmentation_warning() {
        let fragmented = info(5, 5).with("mem_fragmentation_ratio", "1.73");
        let snapshot = MetricsSnapshot::derive(&fragmented, 0, Utc::now()).unwrap();
        assert_eq!(snapshot.warning.as_deref(), Some(FRAGMENTATION_WARNING));
        assert_eq!(snapshot.memory_stats.mem_fragmentation_ratio, 1.73);

        let at_threshold = info(5, 5).with("mem_fragmentation_ratio", "1.5");
        let snapshot = MetricsSnapshot::derive(&at_threshold, 0, Utc::now()).unwrap();
        assert!(snapshot.warning.is_none());
    }

    #[test]
    fn test_malformed_counter_rejected() {
        let broken = BackendInfo::new().with("keyspace_hits", "lots");
        let err = MetricsSnapshot::derive(&broken, 0, Utc::now()).unwrap_err();
        assert!(matches!(err, Error::MalformedInfo { .. }));
    }

    #[test]
    fn test_snapshot_survives_envelope() {
        let snapshot = MetricsSnapshot::derive(
            &info(3, 1).with("mem_fragmentation_ratio", "2.0"),
            2,
            Utc::now(),
        )
        .unwrap();

        let back: MetricsSnapshot = decode(&encode(&snapshot).unwrap()).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn test_degraded_outcome_json() {
        let outcome = MetricsOutcome::Degraded(DegradedMetrics::new(Error::BackendError(
            "connection refused".to_string(),
        )));

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["error"], "Backend error: connection refused");
        assert_eq!(json["cache_stats"]["hits"], 0);
        assert_eq!(json["cache_stats"]["hit_ratio"], 0.0);
        assert!(json.get("source").is_none());
        assert!(matches!(outcome.error(), Some(Error::BackendError(_))));
        assert!(outcome.snapshot().is_none());
    }

    #[test]
    fn test_healthy_outcome_json_is_flat() {
        let snapshot = MetricsSnapshot::derive(&info(9, 1), 1, Utc::now()).unwrap();
        let json = serde_json::to_value(MetricsOutcome::Healthy(snapshot)).unwrap();

        assert_eq!(json["cache_stats"]["hit_ratio"], 90.0);
        assert_eq!(json["effectiveness"], "good");
        assert!(json["warning"].is_null());
        assert!(json.get("error").is_none());
    }
}
