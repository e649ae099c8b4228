//! Error types for the property cache.

use std::fmt;

/// Result type for cache, repository and metrics operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the property cache.
///
/// Only the listing path propagates errors to its caller (and only when the
/// repository fails). Invalidation, metrics collection and history
/// persistence recover locally and carry these values inside their outcome
/// types instead of returning them, which is why the enum is `Clone`.
#[derive(Debug, Clone)]
pub enum Error {
    /// Serialization failed when encoding a value for the cache.
    SerializationError(String),

    /// Deserialization failed when decoding cached bytes.
    ///
    /// **Recovery:** the entry is treated as absent and recomputed.
    DeserializationError(String),

    /// Cached bytes do not carry a valid envelope header.
    InvalidCacheEntry(String),

    /// Cached bytes were written by a different schema version.
    VersionMismatch {
        /// Expected schema version (from compiled code)
        expected: u32,
        /// Found schema version (from cached entry)
        found: u32,
    },

    /// Cache backend error (connection lost, protocol error, timeout).
    BackendError(String),

    /// Source-of-truth repository failed to produce the collection.
    ///
    /// This is the one error the listing path does not recover from.
    RepositoryError(String),

    /// The backend introspection response could not be interpreted.
    ///
    /// Raised when a counter is present but does not parse as a number.
    MalformedInfo {
        /// INFO field name
        field: String,
        /// Raw value as reported by the backend
        value: String,
    },

    /// Operation is not supported by this backend.
    ///
    /// Pattern deletion and introspection are optional backend capabilities.
    NotImplemented(String),

    /// Invalid configuration value.
    ConfigError(String),

    /// Generic error with custom message.
    Other(String),
}

impl Error {
    /// True when the error means "this backend cannot do that" rather than
    /// "this backend tried and failed".
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Error::NotImplemented(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Error::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            Error::InvalidCacheEntry(msg) => write!(f, "Invalid cache entry: {}", msg),
            Error::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Cache version mismatch: expected {}, found {}",
                    expected, found
                )
            }
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
            Error::MalformedInfo { field, value } => {
                write!(f, "Malformed INFO field {}: {:?}", field, value)
            }
            Error::NotImplemented(msg) => write!(f, "Not implemented: {}", msg),
            Error::ConfigError(msg) => write!(f, "Config error: {}", msg),
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            Error::BackendError(e.to_string())
        } else if e.is_syntax() || e.is_data() || e.is_eof() {
            Error::DeserializationError(e.to_string())
        } else {
            Error::SerializationError(e.to_string())
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::BackendError(e.to_string())
    }
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Error::Other(e)
    }
}

impl From<&str> for Error {
    fn from(e: &str) -> Self {
        Error::Other(e.to_string())
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for Error {
    fn from(e: redis::RedisError) -> Self {
        Error::BackendError(format!("Redis error: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::BackendError("connection refused".to_string());
        assert_eq!(err.to_string(), "Backend error: connection refused");
    }

    #[test]
    fn test_malformed_info_display() {
        let err = Error::MalformedInfo {
            field: "keyspace_hits".to_string(),
            value: "lots".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed INFO field keyspace_hits: \"lots\""
        );
    }

    #[test]
    fn test_error_from_string() {
        let err: Error = "test error".into();
        assert!(matches!(err, Error::Other(_)));
    }

    #[test]
    fn test_is_unsupported() {
        assert!(Error::NotImplemented("delete_pattern".to_string()).is_unsupported());
        assert!(!Error::BackendError("down".to_string()).is_unsupported());
    }
}
