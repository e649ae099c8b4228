//! Cache backend implementations.

use crate::error::{Error, Result};
use std::future::Future;
use std::time::Duration;

pub mod info;
pub mod inmemory;
pub mod pattern;
#[cfg(feature = "redis")]
pub mod redis;

pub use info::{BackendInfo, NOT_AVAILABLE};
pub use inmemory::InMemoryBackend;
pub use pattern::glob_match;
#[cfg(feature = "redis")]
pub use redis::{PoolStats, RedisBackend, RedisConfig};

/// Trait for the shared key-value cache service.
///
/// Every component receives a backend handle explicitly; there is no
/// process-wide cache. Handles are cheap to clone and share state.
///
/// The core operations (`get`, `set`, `delete`) are required. Pattern
/// deletion, key listing, TTL inspection and introspection are optional:
/// their default implementations return `Error::NotImplemented`, and callers
/// degrade instead of failing when they see it.
///
/// **IMPORTANT:** All methods use `&self` instead of `&mut self` to allow concurrent access.
/// Backend implementations should use interior mutability or external storage.
///
/// **ASYNC:** Methods return `Send` futures so generic code (and boxed
/// lifecycle listeners) can hold them across tasks. Implementations simply
/// write `async fn`.
pub trait CacheBackend: Send + Sync + Clone {
    /// Retrieve value from cache by key.
    ///
    /// # Returns
    /// - `Ok(Some(bytes))` - Value found in cache
    /// - `Ok(None)` - Cache miss (key not found or expired)
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs (connection lost, etc.)
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;

    /// Store value in cache with optional TTL.
    ///
    /// # Arguments
    /// - `key`: Cache key
    /// - `value`: Serialized bytes
    /// - `ttl`: Time-to-live. None = no expiry
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs
    fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Remove value from cache. Deleting an absent key is not an error.
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs
    fn delete(&self, key: &str) -> impl Future<Output = Result<()>> + Send;

    /// Check if key exists in cache.
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs
    fn exists(&self, key: &str) -> impl Future<Output = Result<bool>> + Send {
        async move { Ok(self.get(key).await?.is_some()) }
    }

    /// Remaining time-to-live of a key.
    ///
    /// # Returns
    /// - `Ok(Some(ttl))` - Key exists and expires
    /// - `Ok(None)` - Key is absent or has no expiry
    ///
    /// # Errors
    /// Returns `Err` if not supported or if the backend fails
    fn ttl(&self, _key: &str) -> impl Future<Output = Result<Option<Duration>>> + Send {
        async { Err(unsupported("ttl")) }
    }

    /// Delete every key matching a glob pattern, returning how many went.
    ///
    /// # Errors
    /// Returns `Error::NotImplemented` if the backend cannot enumerate keys
    fn delete_pattern(&self, _pattern: &str) -> impl Future<Output = Result<u64>> + Send {
        async { Err(unsupported("delete_pattern")) }
    }

    /// List every key matching a glob pattern.
    ///
    /// # Errors
    /// Returns `Error::NotImplemented` if the backend cannot enumerate keys
    fn keys(&self, _pattern: &str) -> impl Future<Output = Result<Vec<String>>> + Send {
        async { Err(unsupported("keys")) }
    }

    /// Introspection counters (hits, misses, memory, clients, ...).
    ///
    /// # Errors
    /// Returns `Err` if not supported, unreachable, or the response is malformed
    fn info(&self) -> impl Future<Output = Result<BackendInfo>> + Send {
        async { Err(unsupported("info")) }
    }

    /// Health check - verify backend is accessible.
    ///
    /// # Errors
    /// Returns `Err` if backend is not accessible
    fn health_check(&self) -> impl Future<Output = Result<bool>> + Send {
        async { Ok(true) }
    }
}

fn unsupported(operation: &str) -> Error {
    Error::NotImplemented(format!("{} not implemented for this backend", operation))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Backend that implements only the required operations.
    #[derive(Clone)]
    struct MinimalBackend;

    impl CacheBackend for MinimalBackend {
        async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>> {
            Ok(None)
        }

        async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Option<Duration>) -> Result<()> {
            Ok(())
        }

        async fn delete(&self, _key: &str) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_backend_exists_default() {
        let backend = InMemoryBackend::new();
        backend
            .set("key", vec![1, 2, 3], None)
            .await
            .expect("Failed to set key");
        assert!(backend.exists("key").await.expect("Failed to check exists"));
        assert!(!backend
            .exists("nonexistent")
            .await
            .expect("Failed to check exists"));
    }

    #[tokio::test]
    async fn test_optional_operations_default_to_not_implemented() {
        let backend = MinimalBackend;
        assert!(backend.delete_pattern("*").await.unwrap_err().is_unsupported());
        assert!(backend.keys("*").await.unwrap_err().is_unsupported());
        assert!(backend.info().await.unwrap_err().is_unsupported());
        assert!(backend.ttl("key").await.unwrap_err().is_unsupported());
        assert!(backend.health_check().await.expect("health check"));
    }
}
