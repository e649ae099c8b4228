//! Storage format for values this crate writes to the backend.
//!
//! Both the cached collection and the metrics history are stored as a
//! Postcard-encoded envelope:
//!
//! ```text
//! ┌─────────────────┬─────────────────┬──────────────────────────┐
//! │  MAGIC (4 bytes)│ VERSION (u32)   │ POSTCARD PAYLOAD         │
//! └─────────────────┴─────────────────┴──────────────────────────┘
//!   "PRCH"
//! ```
//!
//! A wrong magic or version is reported as an error; callers treat such an
//! entry as absent and overwrite it on the next write.
//!
//! ```rust
//! use property_cache::serialization::{decode, encode};
//!
//! # fn main() -> property_cache::Result<()> {
//! let bytes = encode(&vec![1u32, 2, 3])?;
//! let back: Vec<u32> = decode(&bytes)?;
//! assert_eq!(back, vec![1, 2, 3]);
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Magic header for stored entries.
pub const CACHE_MAGIC: [u8; 4] = *b"PRCH";

/// Current schema version.
///
/// Bump when `Property` or `MetricsSnapshot` change shape; entries written by
/// the old layout are then rejected and recomputed.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Versioned envelope around every stored value.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CacheEnvelope<T> {
    pub magic: [u8; 4],
    pub version: u32,
    pub payload: T,
}

impl<T> CacheEnvelope<T> {
    pub fn new(payload: T) -> Self {
        Self {
            magic: CACHE_MAGIC,
            version: CURRENT_SCHEMA_VERSION,
            payload,
        }
    }
}

/// Encode a value inside an envelope.
///
/// # Errors
///
/// Returns `Error::SerializationError` if Postcard serialization fails.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    postcard::to_allocvec(&CacheEnvelope::new(value)).map_err(|e| {
        error!("Cache serialization failed: {}", e);
        Error::SerializationError(e.to_string())
    })
}

/// Decode a value, validating magic and schema version first.
///
/// # Errors
///
/// - `Error::DeserializationError`: bytes are not a Postcard envelope
/// - `Error::InvalidCacheEntry`: magic header mismatch
/// - `Error::VersionMismatch`: written by another schema version
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let envelope: CacheEnvelope<T> = postcard::from_bytes(bytes).map_err(|e| {
        warn!("Cache deserialization failed: {}", e);
        Error::DeserializationError(e.to_string())
    })?;

    if envelope.magic != CACHE_MAGIC {
        warn!(
            "Invalid cache entry: expected magic {:?}, got {:?}",
            CACHE_MAGIC, envelope.magic
        );
        return Err(Error::InvalidCacheEntry(format!(
            "Invalid magic: expected {:?}, got {:?}",
            CACHE_MAGIC, envelope.magic
        )));
    }

    if envelope.version != CURRENT_SCHEMA_VERSION {
        warn!(
            "Cache version mismatch: expected {}, got {}",
            CURRENT_SCHEMA_VERSION, envelope.version
        );
        return Err(Error::VersionMismatch {
            expected: CURRENT_SCHEMA_VERSION,
            found: envelope.version,
        });
    }

    Ok(envelope.payload)
}
