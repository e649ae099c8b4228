//! High-level property service for web applications.
//!
//! Bundles the listing accessor and the metrics pipeline over one backend
//! and one repository, wrapped in `Arc` for easy sharing across handlers.

use crate::backend::CacheBackend;
use crate::collection::CollectionCache;
use crate::config::CacheConfig;
use crate::error::Result;
use crate::metrics::{MetricsCollector, MetricsOutcome, ReportGenerator};
use crate::models::Property;
use crate::observability::CacheMetrics;
use crate::repository::EntityRepository;
use serde::Serialize;
use std::sync::Arc;

/// How long a rendered listing can be stale, outer page cache included.
pub const CACHE_DURATION_LABEL: &str = "15 minutes (view) + 1 hour (queryset)";

/// Everything the listing page renders.
#[derive(Clone, Debug, Serialize)]
pub struct Listing {
    pub properties: Vec<Property>,
    pub cache_duration: &'static str,
    pub cache_metrics: MetricsOutcome,
}

/// Property listing and cache metrics over a shared backend.
///
/// Cloning is cheap (an `Arc` increment) and clones share everything.
///
/// # Example
///
/// ```ignore
/// use property_cache::{CacheConfig, PropertyService, InvalidationListener};
/// use property_cache::backend::InMemoryBackend;
/// use property_cache::repository::InMemoryRepository;
///
/// let backend = InMemoryBackend::new();
/// let config = CacheConfig::default();
///
/// let mut repository = InMemoryRepository::new();
/// repository.subscribe(Arc::new(InvalidationListener::new(backend.clone(), config.clone())));
/// let repository = Arc::new(repository);
///
/// let service = PropertyService::new(backend, repository.clone(), &config);
/// let properties = service.get_all_properties().await?;
/// let report = service.build_report().await;
/// ```
pub struct PropertyService<B: CacheBackend, R: EntityRepository<Property>> {
    inner: Arc<Inner<B, R>>,
}

struct Inner<B: CacheBackend, R> {
    collection: CollectionCache<B>,
    reports: ReportGenerator<B>,
    repository: R,
}

impl<B: CacheBackend, R: EntityRepository<Property>> Clone for PropertyService<B, R> {
    fn clone(&self) -> Self {
        PropertyService {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: CacheBackend, R: EntityRepository<Property>> PropertyService<B, R> {
    pub fn new(backend: B, repository: R, config: &CacheConfig) -> Self {
        Self::build(CollectionCache::new(backend.clone(), config), backend, repository, config)
    }

    /// Create a service whose accessor reports to `metrics`.
    pub fn with_metrics(
        backend: B,
        repository: R,
        config: &CacheConfig,
        metrics: Arc<dyn CacheMetrics>,
    ) -> Self {
        let collection = CollectionCache::new(backend.clone(), config).with_metrics(metrics);
        Self::build(collection, backend, repository, config)
    }

    fn build(collection: CollectionCache<B>, backend: B, repository: R, config: &CacheConfig) -> Self {
        PropertyService {
            inner: Arc::new(Inner {
                collection,
                reports: ReportGenerator::new(MetricsCollector::new(backend, config)),
                repository,
            }),
        }
    }

    /// All properties, cache first.
    ///
    /// # Errors
    ///
    /// Returns the repository's error when the cache misses and the fetch
    /// fails. Cache backend problems are logged and never returned.
    pub async fn get_all_properties(&self) -> Result<Vec<Property>> {
        self.inner.collection.get_all(&self.inner.repository).await
    }

    /// Fresh metrics snapshot (appended to history when healthy).
    pub async fn collect_metrics(&self) -> MetricsOutcome {
        self.inner.reports.collector().collect_metrics().await
    }

    /// Text report, or a one-line error message if metrics are unavailable.
    pub async fn build_report(&self) -> String {
        self.inner.reports.build_report().await
    }

    /// Fresh metrics as pretty-printed JSON for machine consumers.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON encoding fails.
    pub async fn metrics_json(&self) -> Result<String> {
        let outcome = self.collect_metrics().await;
        Ok(serde_json::to_string_pretty(&outcome)?)
    }

    /// Properties plus the metrics shown alongside them.
    ///
    /// # Errors
    ///
    /// Same as [`PropertyService::get_all_properties`].
    pub async fn listing(&self) -> Result<Listing> {
        let properties = self.get_all_properties().await?;
        let cache_metrics = self.collect_metrics().await;
        Ok(Listing {
            properties,
            cache_duration: CACHE_DURATION_LABEL,
            cache_metrics,
        })
    }

    pub fn repository(&self) -> &R {
        &self.inner.repository
    }

    pub fn collection(&self) -> &CollectionCache<B> {
        &self.inner.collection
    }

    pub fn reports(&self) -> &ReportGenerator<B> {
        &self.inner.reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;
    use crate::invalidation::InvalidationListener;
    use crate::repository::InMemoryRepository;

    fn fixtures() -> Vec<Property> {
        vec![
            Property::new(1, "Loft", "Top floor", 1800.0, "Lisbon"),
            Property::new(2, "Cottage", "Garden", 950.0, "Sintra"),
        ]
    }

    #[tokio::test]
    async fn test_service_listing() {
        let backend = InMemoryBackend::new();
        let service = PropertyService::new(
            backend,
            InMemoryRepository::with_entities(fixtures()),
            &CacheConfig::default(),
        );

        let listing = service.listing().await.expect("listing");

        assert_eq!(listing.properties.len(), 2);
        assert_eq!(listing.cache_duration, "15 minutes (view) + 1 hour (queryset)");
        assert!(listing.cache_metrics.is_healthy());
    }

    #[tokio::test]
    async fn test_service_clone_shares_state() {
        let service = PropertyService::new(
            InMemoryBackend::new(),
            InMemoryRepository::with_entities(fixtures()),
            &CacheConfig::default(),
        );
        let clone = service.clone();

        assert!(Arc::ptr_eq(&service.inner, &clone.inner));
        service.get_all_properties().await.unwrap();
        assert!(clone.collection().cached::<Property>().await.is_some());
    }

    #[tokio::test]
    async fn test_service_sees_writes_through_shared_repository() {
        let backend = InMemoryBackend::new();
        let config = CacheConfig::default();

        let mut repository = InMemoryRepository::with_entities(fixtures());
        repository.subscribe(Arc::new(InvalidationListener::new(
            backend.clone(),
            config.clone(),
        )));
        let repository = Arc::new(repository);
        let service = PropertyService::new(backend, repository.clone(), &config);

        assert_eq!(service.get_all_properties().await.unwrap().len(), 2);
        repository
            .save(Property::new(3, "Studio", "", 700.0, "Porto"))
            .await
            .unwrap();
        assert_eq!(service.get_all_properties().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_metrics_json_and_report() {
        let service = PropertyService::new(
            InMemoryBackend::new(),
            InMemoryRepository::<Property>::new(),
            &CacheConfig::default(),
        );

        let json: serde_json::Value =
            serde_json::from_str(&service.metrics_json().await.unwrap()).unwrap();
        assert!(json.get("cache_stats").is_some());
        assert!(json.get("error").is_none());

        let report = service.build_report().await;
        assert!(report.starts_with("CACHE EFFECTIVENESS REPORT"));
        // Two collections so far, so the trend line is present.
        assert!(report.contains("TREND: Cache effectiveness is"));
    }

    #[tokio::test]
    async fn test_metrics_json_is_flat_snapshot() {
        let service = PropertyService::new(
            InMemoryBackend::new(),
            InMemoryRepository::with_entities(fixtures()),
            &CacheConfig::default(),
        );
        service.get_all_properties().await.unwrap();
        service.get_all_properties().await.unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&service.metrics_json().await.unwrap()).unwrap();
        let object = json.as_object().expect("top-level object");

        for section in [
            "timestamp",
            "cache_stats",
            "memory_stats",
            "keyspace_stats",
            "client_stats",
            "performance_stats",
            "replication_stats",
            "effectiveness",
            "analysis",
        ] {
            assert!(object.contains_key(section), "missing {}", section);
        }
        assert!(!object.contains_key("backend"));
        assert_eq!(json["cache_stats"]["hits"], 1);
        assert_eq!(json["cache_stats"]["misses"], 1);
    }
}
