//! Backend metrics analysis.
//!
//! The pipeline runs on demand, never in the background:
//!
//! ```text
//! CacheBackend::info + keys("*")
//!        │
//!        ▼
//! MetricsCollector ── derive ratios, classify, warn ──► MetricsOutcome
//!        │ (healthy only)
//!        ▼
//! MetricsHistory (bounded, stored under the history key)
//!        │
//!        ▼
//! ReportGenerator ── text report with trend line
//! ```

pub mod collector;
pub mod history;
pub mod report;
pub mod snapshot;

pub use collector::MetricsCollector;
pub use history::{HistoryAppend, MetricsHistory};
pub use report::{render_report, ReportGenerator, Trend};
pub use snapshot::{
    CacheStats, ClientStats, DegradedMetrics, Effectiveness, KeyspaceStats, MemoryStats,
    MetricsOutcome, MetricsSnapshot, PerformanceStats, ReplicationStats,
};
