//! Cache key layout and lifetimes.
//!
//! Everything the crate persists lives under three reserved names in the
//! shared backend: the collection key, the metrics history key and the glob
//! pattern that matches dependent presentation-layer caches.

use crate::error::{Error, Result};
use std::time::Duration;

/// Default key holding the full property collection.
pub const DEFAULT_COLLECTION_KEY: &str = "all_properties";

/// Default key holding the metrics history.
pub const DEFAULT_HISTORY_KEY: &str = "cache_metrics_history";

/// Default glob matching rendered-page caches that depend on the collection.
pub const DEFAULT_DEPENDENT_PATTERN: &str = "views.decorators.cache.*";

/// One hour.
pub const DEFAULT_COLLECTION_TTL: Duration = Duration::from_secs(3600);

/// Twenty-four hours.
pub const DEFAULT_HISTORY_TTL: Duration = Duration::from_secs(86_400);

pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Shared configuration for the accessor, the invalidation listener and the
/// metrics pipeline.
///
/// # Example
///
/// ```
/// use property_cache::CacheConfig;
/// use std::time::Duration;
///
/// let config = CacheConfig::default()
///     .with_collection_ttl(Duration::from_secs(600))
///     .with_history_capacity(50);
///
/// assert_eq!(config.collection_key, "all_properties");
/// assert_eq!(config.history_capacity, 50);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    pub collection_key: String,
    pub collection_ttl: Duration,
    pub history_key: String,
    /// Refreshed on every append, independent of snapshot ages.
    pub history_ttl: Duration,
    pub history_capacity: usize,
    pub dependent_pattern: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            collection_key: DEFAULT_COLLECTION_KEY.to_string(),
            collection_ttl: DEFAULT_COLLECTION_TTL,
            history_key: DEFAULT_HISTORY_KEY.to_string(),
            history_ttl: DEFAULT_HISTORY_TTL,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            dependent_pattern: DEFAULT_DEPENDENT_PATTERN.to_string(),
        }
    }
}

impl CacheConfig {
    /// Defaults overridden by environment variables.
    ///
    /// - `PROPERTY_CACHE_TTL_SECS`: collection TTL
    /// - `PROPERTY_HISTORY_TTL_SECS`: history TTL
    /// - `PROPERTY_HISTORY_CAPACITY`: history capacity (must be > 0)
    ///
    /// # Errors
    /// Returns `Error::ConfigError` if a variable is set but not a valid number.
    pub fn from_env() -> Result<Self> {
        let mut config = CacheConfig::default();

        if let Some(secs) = env_u64("PROPERTY_CACHE_TTL_SECS")? {
            config.collection_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = env_u64("PROPERTY_HISTORY_TTL_SECS")? {
            config.history_ttl = Duration::from_secs(secs);
        }
        if let Some(capacity) = env_u64("PROPERTY_HISTORY_CAPACITY")? {
            if capacity == 0 {
                return Err(Error::ConfigError(
                    "PROPERTY_HISTORY_CAPACITY must be greater than 0".to_string(),
                ));
            }
            config.history_capacity = capacity as usize;
        }

        debug!("Cache config loaded: {:?}", config);
        Ok(config)
    }

    pub fn with_collection_key(mut self, key: impl Into<String>) -> Self {
        self.collection_key = key.into();
        self
    }

    pub fn with_collection_ttl(mut self, ttl: Duration) -> Self {
        self.collection_ttl = ttl;
        self
    }

    pub fn with_history_key(mut self, key: impl Into<String>) -> Self {
        self.history_key = key.into();
        self
    }

    pub fn with_history_ttl(mut self, ttl: Duration) -> Self {
        self.history_ttl = ttl;
        self
    }

    /// Capacity is clamped to at least one entry.
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity.max(1);
        self
    }

    pub fn with_dependent_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.dependent_pattern = pattern.into();
        self
    }
}

fn env_u64(name: &str) -> Result<Option<u64>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|e| Error::ConfigError(format!("{} must be an integer: {}", name, e))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.collection_key, "all_properties");
        assert_eq!(config.collection_ttl, Duration::from_secs(3600));
        assert_eq!(config.history_key, "cache_metrics_history");
        assert_eq!(config.history_ttl, Duration::from_secs(86_400));
        assert_eq!(config.history_capacity, 100);
        assert_eq!(config.dependent_pattern, "views.decorators.cache.*");
    }

    #[test]
    fn test_config_builders() {
        let config = CacheConfig::default()
            .with_collection_key("listing")
            .with_history_key("history")
            .with_history_ttl(Duration::from_secs(60))
            .with_dependent_pattern("page:*");

        assert_eq!(config.collection_key, "listing");
        assert_eq!(config.history_key, "history");
        assert_eq!(config.history_ttl, Duration::from_secs(60));
        assert_eq!(config.dependent_pattern, "page:*");
    }

    #[test]
    fn test_history_capacity_clamped() {
        let config = CacheConfig::default().with_history_capacity(0);
        assert_eq!(config.history_capacity, 1);
    }

    #[test]
    fn test_env_u64_unset_is_none() {
        assert_eq!(
            env_u64("PROPERTY_CACHE_TEST_VARIABLE_NEVER_SET").expect("parse"),
            None
        );
    }
}
