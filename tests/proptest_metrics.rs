//! Property-based tests for metrics derivation and history bounds.
//!
//! # Properties Tested
//!
//! 1. **Ratio Property**: hit + miss ratio is 100 (within rounding) whenever
//!    there were requests, and both ratios stay within 0..=100
//! 2. **Request Property**: hits + misses == total_requests
//! 3. **Classification Property**: bands are strict at 90/70/50
//! 4. **History Property**: history never exceeds its capacity and keeps the
//!    newest entries in order

use chrono::Utc;
use property_cache::backend::{BackendInfo, InMemoryBackend};
use property_cache::metrics::{CacheStats, Effectiveness, MetricsHistory, MetricsSnapshot};
use property_cache::CacheConfig;
use proptest::prelude::*;

fn info(hits: u64, misses: u64) -> BackendInfo {
    BackendInfo::new()
        .with("keyspace_hits", hits)
        .with("keyspace_misses", misses)
}

proptest! {
    #[test]
    fn prop_ratios_sum_to_hundred(hits in 0u64..10_000_000, misses in 0u64..10_000_000) {
        let stats = CacheStats::new(hits, misses);

        prop_assert_eq!(stats.total_requests, hits + misses);
        prop_assert!((0.0..=100.0).contains(&stats.hit_ratio));
        prop_assert!((0.0..=100.0).contains(&stats.miss_ratio));

        if stats.total_requests > 0 {
            prop_assert!((stats.hit_ratio + stats.miss_ratio - 100.0).abs() <= 0.011);
        } else {
            prop_assert_eq!(stats.hit_ratio, 0.0);
            prop_assert_eq!(stats.miss_ratio, 0.0);
        }
    }

    #[test]
    fn prop_classification_matches_bands(ratio in 0.0f64..=100.0) {
        let expected = if ratio > 90.0 {
            Effectiveness::Excellent
        } else if ratio > 70.0 {
            Effectiveness::Good
        } else if ratio > 50.0 {
            Effectiveness::Moderate
        } else {
            Effectiveness::Low
        };
        prop_assert_eq!(Effectiveness::classify(ratio), expected);
    }

    #[test]
    fn prop_exact_thresholds_fall_into_lower_band(total in 1u64..1_000) {
        // hits / (hits + misses) landing exactly on a threshold
        let hundredths = total * 10;
        let cases = [
            (hundredths * 9, hundredths, Effectiveness::Good),
            (hundredths * 7, hundredths * 3, Effectiveness::Moderate),
            (hundredths * 5, hundredths * 5, Effectiveness::Low),
        ];
        for (hits, misses, expected) in cases {
            let snapshot = MetricsSnapshot::derive(&info(hits, misses), 0, Utc::now()).unwrap();
            prop_assert_eq!(snapshot.effectiveness, expected);
        }
    }

    #[test]
    fn prop_history_bounded(capacity in 1usize..8, appends in 0u64..20) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let config = CacheConfig::default().with_history_capacity(capacity);
            let history = MetricsHistory::new(InMemoryBackend::new(), &config);

            for hits in 0..appends {
                let snapshot = MetricsSnapshot::derive(&info(hits, 1), 0, Utc::now()).unwrap();
                history.append(&snapshot).await;
            }

            let stored: Vec<u64> = history.read().await.iter().map(|s| s.cache_stats.hits).collect();
            let expected: Vec<u64> =
                (appends.saturating_sub(capacity as u64)..appends).collect();

            prop_assert!(stored.len() <= capacity);
            prop_assert_eq!(stored, expected);
            Ok(())
        })?;
    }
}
