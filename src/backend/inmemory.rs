//! In-memory cache backend (default, thread-safe, async).
//!
//! Uses DashMap for lock-free concurrent access with per-key sharding.
//! Automatically handles TTL expiration on access, and keeps the same
//! keyspace counters Redis reports so the metrics pipeline works unchanged
//! against it.

use super::{glob_match, BackendInfo, CacheBackend};
use crate::error::Result;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// In-memory cache entry with optional expiration.
struct CacheEntry {
    data: Vec<u8>,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(data: Vec<u8>, ttl: Option<Duration>) -> Self {
        let expires_at = ttl.map(|d| Instant::now() + d);
        CacheEntry { data, expires_at }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Instant::now() > exp)
    }
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    expired: AtomicU64,
    commands: AtomicU64,
    peak_bytes: AtomicU64,
}

/// Thread-safe async in-memory cache backend.
///
/// Clones share the same store and counters.
///
/// # Example
///
/// ```no_run
/// use property_cache::backend::{InMemoryBackend, CacheBackend};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let backend = InMemoryBackend::new();
///
///     backend.set("key1", b"value".to_vec(), None).await?;
///     assert!(backend.get("key1").await?.is_some());
///
///     backend.set("key2", b"expires".to_vec(), Some(Duration::from_secs(300))).await?;
///     assert!(backend.ttl("key2").await?.is_some());
///
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct InMemoryBackend {
    store: Arc<DashMap<String, CacheEntry>>,
    counters: Arc<Counters>,
    started_at: Instant,
}

impl InMemoryBackend {
    /// Create a new in-memory cache backend.
    pub fn new() -> Self {
        InMemoryBackend {
            store: Arc::new(DashMap::new()),
            counters: Arc::new(Counters::default()),
            started_at: Instant::now(),
        }
    }

    /// Get the current number of live entries in cache.
    pub async fn len(&self) -> usize {
        self.store.iter().filter(|entry| !entry.is_expired()).count()
    }

    /// Check if cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Get memory statistics.
    pub async fn stats(&self) -> InMemoryStats {
        InMemoryStats {
            total_entries: self.store.len(),
            expired_entries: self.store.iter().filter(|entry| entry.is_expired()).count(),
            total_bytes: self.used_bytes() as usize,
        }
    }

    fn used_bytes(&self) -> u64 {
        self.store
            .iter()
            .map(|entry| (entry.key().len() + entry.data.len()) as u64)
            .sum()
    }

    fn count_command(&self) {
        self.counters.commands.fetch_add(1, Ordering::Relaxed);
    }

    /// Drop an expired entry, counting it the way Redis counts lazy expiry.
    fn expire(&self, key: &str) {
        if self
            .store
            .remove_if(key, |_, entry| entry.is_expired())
            .is_some()
        {
            self.counters.expired.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheBackend for InMemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.count_command();

        if let Some(entry) = self.store.get(key) {
            if !entry.is_expired() {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                debug!("✓ InMemory GET {} -> HIT", key);
                return Ok(Some(entry.data.clone()));
            }
        }

        self.expire(key);
        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        debug!("✓ InMemory GET {} -> MISS", key);
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        self.count_command();
        self.store.insert(key.to_string(), CacheEntry::new(value, ttl));
        self.counters
            .peak_bytes
            .fetch_max(self.used_bytes(), Ordering::Relaxed);

        if let Some(d) = ttl {
            debug!("✓ InMemory SET {} (TTL: {:?})", key, d);
        } else {
            debug!("✓ InMemory SET {}", key);
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.count_command();
        self.store.remove(key);
        debug!("✓ InMemory DELETE {}", key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.count_command();
        if let Some(entry) = self.store.get(key) {
            return Ok(!entry.is_expired());
        }

        Ok(false)
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        self.count_command();
        Ok(self.store.get(key).and_then(|entry| {
            entry
                .expires_at
                .and_then(|exp| exp.checked_duration_since(Instant::now()))
        }))
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<u64> {
        self.count_command();
        let mut deleted = 0u64;
        let mut expired = 0u64;
        self.store.retain(|key, entry| {
            if !glob_match(pattern, key) {
                return true;
            }
            if entry.is_expired() {
                expired += 1;
            } else {
                deleted += 1;
            }
            false
        });
        self.counters.expired.fetch_add(expired, Ordering::Relaxed);
        debug!("✓ InMemory DELETE_PATTERN {} ({} keys)", pattern, deleted);
        Ok(deleted)
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        self.count_command();
        let keys: Vec<String> = self
            .store
            .iter()
            .filter(|entry| !entry.is_expired() && glob_match(pattern, entry.key()))
            .map(|entry| entry.key().clone())
            .collect();
        debug!("✓ InMemory KEYS {} -> {} keys", pattern, keys.len());
        Ok(keys)
    }

    async fn info(&self) -> Result<BackendInfo> {
        self.count_command();
        let used = self.used_bytes();
        let peak = self.counters.peak_bytes.load(Ordering::Relaxed).max(used);
        let uptime = self.started_at.elapsed().as_secs();

        Ok(BackendInfo::new()
            .with("uptime_in_seconds", uptime)
            .with("keyspace_hits", self.counters.hits.load(Ordering::Relaxed))
            .with("keyspace_misses", self.counters.misses.load(Ordering::Relaxed))
            .with("expired_keys", self.counters.expired.load(Ordering::Relaxed))
            .with("evicted_keys", 0)
            .with("used_memory", used)
            .with("used_memory_human", human_bytes(used))
            .with("used_memory_peak_human", human_bytes(peak))
            .with("used_memory_rss_human", human_bytes(used))
            .with("mem_fragmentation_ratio", "1.00")
            .with("maxmemory_human", human_bytes(0))
            .with("connected_clients", Arc::strong_count(&self.store))
            .with("blocked_clients", 0)
            .with("client_longest_output_list", 0)
            .with("instantaneous_ops_per_sec", 0)
            .with("instantaneous_input_kbps", "0.00")
            .with("instantaneous_output_kbps", "0.00")
            .with(
                "total_commands_processed",
                self.counters.commands.load(Ordering::Relaxed),
            )
            .with("role", "master")
            .with("connected_slaves", 0))
    }

    async fn health_check(&self) -> Result<bool> {
        // In-memory backend is always healthy
        Ok(true)
    }
}

/// Format a byte count the way Redis renders `*_human` fields.
pub(crate) fn human_bytes(bytes: u64) -> String {
    const K: f64 = 1024.0;
    let b = bytes as f64;
    if b < K {
        format!("{}B", bytes)
    } else if b < K * K {
        format!("{:.2}K", b / K)
    } else if b < K * K * K {
        format!("{:.2}M", b / (K * K))
    } else {
        format!("{:.2}G", b / (K * K * K))
    }
}

/// Cache statistics.
#[derive(Clone, Debug)]
pub struct InMemoryStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub total_bytes: usize,
}
