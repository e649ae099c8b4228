//! Write-triggered invalidation of the cached collection.
//!
//! On every create, update or delete the listener:
//!
//! 1. deletes the collection key (idempotent, absent keys are fine), then
//! 2. deletes every key matching the dependent-cache pattern, best effort.
//!
//! Neither step can fail the write. Failures are logged at `warn` and
//! reported in the returned [`InvalidationOutcome`] so callers and tests can
//! see exactly what did not happen.

use crate::backend::CacheBackend;
use crate::config::CacheConfig;
use crate::entity::Entity;
use crate::error::Error;
use crate::lifecycle::{LifecycleEvent, LifecycleListener};
use crate::observability::{CacheMetrics, NoOpMetrics};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Which invalidation step failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvalidationStage {
    /// Deleting the fixed collection key.
    CollectionKey,
    /// Deleting keys matching the dependent-cache pattern.
    DependentPattern,
}

impl fmt::Display for InvalidationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidationStage::CollectionKey => write!(f, "collection key"),
            InvalidationStage::DependentPattern => write!(f, "dependent pattern"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct InvalidationFailure {
    pub stage: InvalidationStage,
    pub error: Error,
}

/// Result of one invalidation pass.
#[derive(Clone, Debug)]
pub enum InvalidationOutcome {
    /// Collection key gone, dependent keys swept.
    Complete {
        /// Number of dependent keys removed by the pattern sweep.
        dependents_removed: u64,
    },
    /// At least one step failed; the write still succeeded.
    Degraded(Vec<InvalidationFailure>),
}

impl InvalidationOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, InvalidationOutcome::Complete { .. })
    }

    pub fn failures(&self) -> &[InvalidationFailure] {
        match self {
            InvalidationOutcome::Complete { .. } => &[],
            InvalidationOutcome::Degraded(failures) => failures,
        }
    }

    /// True if the collection key itself may still be present.
    pub fn collection_stale(&self) -> bool {
        self.failures()
            .iter()
            .any(|f| f.stage == InvalidationStage::CollectionKey)
    }
}

/// Evicts the cached collection when entities change.
///
/// # Example
///
/// ```ignore
/// let listener = InvalidationListener::new(backend.clone(), CacheConfig::default());
/// let outcome = listener.invalidate(&LifecycleEvent::Updated { id: 42u64 }).await;
/// assert!(outcome.is_complete());
/// ```
pub struct InvalidationListener<B: CacheBackend> {
    backend: B,
    config: CacheConfig,
    metrics: Arc<dyn CacheMetrics>,
}

impl<B: CacheBackend> InvalidationListener<B> {
    pub fn new(backend: B, config: CacheConfig) -> Self {
        InvalidationListener {
            backend,
            config,
            metrics: Arc::new(NoOpMetrics),
        }
    }

    /// Set custom metrics handler.
    pub fn with_metrics(mut self, metrics: Arc<dyn CacheMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Run both invalidation steps for one event.
    pub async fn invalidate<Id: fmt::Display>(
        &self,
        event: &LifecycleEvent<Id>,
    ) -> InvalidationOutcome {
        info!("Entity {} - invalidating cache", event);

        let mut failures = Vec::new();
        let key = self.config.collection_key.as_str();
        let timer = Instant::now();

        match self.backend.delete(key).await {
            Ok(()) => self.metrics.record_delete(key, timer.elapsed()),
            Err(e) => {
                warn!("Failed to delete {} after {}: {}", key, event, e);
                self.metrics.record_error(key, &e.to_string());
                failures.push(InvalidationFailure {
                    stage: InvalidationStage::CollectionKey,
                    error: e,
                });
            }
        }

        let pattern = self.config.dependent_pattern.as_str();
        let mut dependents_removed = 0;
        match self.backend.delete_pattern(pattern).await {
            Ok(removed) => {
                debug!("Removed {} dependent cache keys matching {}", removed, pattern);
                dependents_removed = removed;
            }
            Err(e) if e.is_unsupported() => {
                warn!(
                    "Backend cannot delete by pattern, dependent caches under {} left to expire: {}",
                    pattern, e
                );
                failures.push(InvalidationFailure {
                    stage: InvalidationStage::DependentPattern,
                    error: e,
                });
            }
            Err(e) => {
                warn!("Failed to delete keys matching {}: {}", pattern, e);
                failures.push(InvalidationFailure {
                    stage: InvalidationStage::DependentPattern,
                    error: e,
                });
            }
        }

        if failures.is_empty() {
            InvalidationOutcome::Complete { dependents_removed }
        } else {
            InvalidationOutcome::Degraded(failures)
        }
    }
}

impl<B, T> LifecycleListener<T> for InvalidationListener<B>
where
    B: CacheBackend + 'static,
    T: Entity,
{
    fn on_event<'a>(&'a self, event: &'a LifecycleEvent<T::Id>) -> BoxFuture<'a, ()> {
        async move {
            // Failures are already logged; the write must not see them.
            let _ = self.invalidate(event).await;
        }
        .boxed()
    }
}
