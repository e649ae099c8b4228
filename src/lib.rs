//! # property-cache
//!
//! Cache-aside listing cache with write-triggered invalidation and backend
//! metrics analysis.
//!
//! ## Features
//!
//! - **Cache-Aside Listing:** The full property collection is served from one
//!   cache key and repopulated from the repository on a miss (1 hour TTL)
//! - **Write-Triggered Invalidation:** Repository writes evict the cached
//!   collection and any dependent page caches before the write returns
//! - **Backend Metrics:** Hit ratio, memory, eviction, client and throughput
//!   stats read from the backend's `INFO`, classified and kept in a bounded
//!   history
//! - **Reports:** Text report with a trend line over the retained history
//! - **Backend Agnostic:** In-memory (default) and Redis backends
//! - **Never Fails Sideways:** Invalidation, metrics and history degrade into
//!   explicit outcome values; only repository failures reach the caller
//!
//! ## Quick Start
//!
//! ```ignore
//! use property_cache::{
//!     CacheConfig, InvalidationListener, Property, PropertyService,
//!     backend::InMemoryBackend,
//!     repository::InMemoryRepository,
//! };
//! use std::sync::Arc;
//!
//! // 1. Shared backend handle and key layout
//! let backend = InMemoryBackend::new();
//! let config = CacheConfig::default();
//!
//! // 2. Repository that invalidates the cache after each write
//! let mut repository = InMemoryRepository::new();
//! repository.subscribe(Arc::new(InvalidationListener::new(backend.clone(), config.clone())));
//! let repository = Arc::new(repository);
//!
//! // 3. Service handed to the web layer (Clone is an Arc increment)
//! let service = PropertyService::new(backend, repository.clone(), &config);
//!
//! // 4. Use it
//! repository.save(Property::new(1, "Loft", "Top floor", 1800.0, "Lisbon")).await?;
//! let properties = service.get_all_properties().await?;
//! let report = service.build_report().await;
//! ```

#[macro_use]
extern crate log;

pub mod backend;
pub mod collection;
pub mod config;
pub mod entity;
pub mod error;
pub mod invalidation;
pub mod lifecycle;
pub mod metrics;
pub mod models;
pub mod observability;
pub mod repository;
pub mod serialization;
pub mod service;

// Re-exports for convenience
pub use backend::CacheBackend;
pub use collection::{CollectionCache, LoadSource, Loaded};
pub use config::CacheConfig;
pub use entity::Entity;
pub use error::{Error, Result};
pub use invalidation::{InvalidationListener, InvalidationOutcome};
pub use lifecycle::{LifecycleEvent, LifecycleHub, LifecycleListener};
pub use metrics::{MetricsCollector, MetricsOutcome, MetricsSnapshot, ReportGenerator};
pub use models::Property;
pub use repository::EntityRepository;
pub use service::{Listing, PropertyService};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
