//! Cache-aside accessor for the full entity collection.
//!
//! The whole collection lives under one key. A read either returns the
//! cached sequence unchanged (hit) or fetches from the repository and
//! rewrites that key with a fixed TTL (miss). No other key is touched.
//!
//! There is no stampede protection: concurrent misses each reach the
//! repository and the last write wins. That is acceptable for a single,
//! rarely written collection and is the first thing to revisit if the
//! listing ever becomes hot.

use crate::backend::CacheBackend;
use crate::config::CacheConfig;
use crate::entity::Entity;
use crate::error::Result;
use crate::observability::{CacheMetrics, NoOpMetrics};
use crate::repository::EntityRepository;
use crate::serialization::{decode, encode};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Where a listing came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadSource {
    Cache,
    Repository,
}

impl fmt::Display for LoadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadSource::Cache => write!(f, "cache"),
            LoadSource::Repository => write!(f, "repository"),
        }
    }
}

/// A collection read together with its provenance.
#[derive(Clone, Debug)]
pub struct Loaded<T> {
    pub entities: Vec<T>,
    pub source: LoadSource,
}

/// Cache-aside accessor.
///
/// # Example
///
/// ```ignore
/// use property_cache::{CollectionCache, CacheConfig, backend::InMemoryBackend};
///
/// let cache = CollectionCache::new(InMemoryBackend::new(), &CacheConfig::default());
/// let properties: Vec<Property> = cache.get_all(&repository).await?;
/// ```
pub struct CollectionCache<B: CacheBackend> {
    backend: B,
    key: String,
    ttl: Duration,
    metrics: Arc<dyn CacheMetrics>,
}

impl<B: CacheBackend> CollectionCache<B> {
    /// Create accessor using the collection key and TTL from `config`.
    pub fn new(backend: B, config: &CacheConfig) -> Self {
        CollectionCache {
            backend,
            key: config.collection_key.clone(),
            ttl: config.collection_ttl,
            metrics: Arc::new(NoOpMetrics),
        }
    }

    /// Set custom metrics handler.
    pub fn with_metrics(mut self, metrics: Arc<dyn CacheMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get backend reference (for advanced use).
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Return the full collection, from cache when present.
    ///
    /// # Errors
    ///
    /// Only repository failures are returned, unchanged. Backend failures
    /// are logged: a failed read counts as a miss, a failed write leaves the
    /// key empty for the next caller.
    pub async fn get_all<T, R>(&self, repository: &R) -> Result<Vec<T>>
    where
        T: Entity,
        R: EntityRepository<T>,
    {
        Ok(self.load(repository).await?.entities)
    }

    /// Same as [`CollectionCache::get_all`], also reporting hit or miss.
    ///
    /// # Errors
    ///
    /// Returns the repository's error on a miss whose fetch fails.
    pub async fn load<T, R>(&self, repository: &R) -> Result<Loaded<T>>
    where
        T: Entity,
        R: EntityRepository<T>,
    {
        let timer = Instant::now();

        if let Some(entities) = self.cached::<T>().await {
            self.metrics.record_hit(&self.key, timer.elapsed());
            info!("Cache hit for {}", self.key);
            return Ok(Loaded {
                entities,
                source: LoadSource::Cache,
            });
        }

        info!(
            "Cache miss for {} - fetching {} collection from repository",
            self.key,
            T::entity_name()
        );
        let entities = repository.fetch_all().await?;
        self.store(&entities).await;
        self.metrics.record_miss(&self.key, timer.elapsed());

        Ok(Loaded {
            entities,
            source: LoadSource::Repository,
        })
    }

    /// Read the cached collection without falling back.
    ///
    /// Backend errors and undecodable entries read as `None`.
    pub async fn cached<T: Entity>(&self) -> Option<Vec<T>> {
        match self.backend.get(&self.key).await {
            Ok(Some(bytes)) => match decode::<Vec<T>>(&bytes) {
                Ok(entities) => Some(entities),
                Err(e) => {
                    warn!("Discarding undecodable entry under {}: {}", self.key, e);
                    self.metrics.record_error(&self.key, &e.to_string());
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("Cache read for {} failed, treating as miss: {}", self.key, e);
                self.metrics.record_error(&self.key, &e.to_string());
                None
            }
        }
    }

    async fn store<T: Entity>(&self, entities: &[T]) {
        let timer = Instant::now();
        let bytes = match encode(&entities) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to encode {}: {}", self.key, e);
                self.metrics.record_error(&self.key, &e.to_string());
                return;
            }
        };

        match self.backend.set(&self.key, bytes, Some(self.ttl)).await {
            Ok(()) => {
                self.metrics.record_set(&self.key, timer.elapsed());
                info!(
                    "Stored {} {} entities under {} for {}s",
                    entities.len(),
                    T::entity_name(),
                    self.key,
                    self.ttl.as_secs()
                );
            }
            Err(e) => {
                warn!("Failed to populate {}: {}", self.key, e);
                self.metrics.record_error(&self.key, &e.to_string());
            }
        }
    }
}
