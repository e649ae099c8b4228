//! Backend introspection data.
//!
//! Backends report their counters as a flat `name -> value` mapping, the way
//! Redis `INFO` does. [`BackendInfo`] holds that mapping and offers typed
//! accessors that default missing fields but reject garbage.

use crate::error::{Error, Result};
use std::collections::HashMap;

/// Placeholder for human-readable fields the backend did not report.
pub const NOT_AVAILABLE: &str = "N/A";

/// Flat mapping of introspection counters.
///
/// # Example
///
/// ```
/// use property_cache::backend::BackendInfo;
///
/// let info = BackendInfo::parse("# Stats\r\nkeyspace_hits:90\r\nkeyspace_misses:10\r\n");
/// assert_eq!(info.get_u64("keyspace_hits").unwrap(), 90);
/// assert_eq!(info.get_u64("evicted_keys").unwrap(), 0);
/// assert_eq!(info.get_str("role"), "N/A");
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BackendInfo {
    fields: HashMap<String, String>,
}

impl BackendInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the text format of Redis `INFO`.
    ///
    /// Section headers (`# Memory`) and blank lines are skipped. Lines
    /// without a `:` separator are ignored.
    pub fn parse(raw: &str) -> Self {
        let mut fields = HashMap::new();
        for line in raw.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((name, value)) = line.split_once(':') {
                fields.insert(name.trim().to_string(), value.trim().to_string());
            }
        }
        BackendInfo { fields }
    }

    /// Set a field, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl ToString) {
        self.fields.insert(name.into(), value.to_string());
    }

    /// Builder form of [`BackendInfo::insert`].
    pub fn with(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.insert(name, value);
        self
    }

    pub fn raw(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Unsigned counter, `0` when absent.
    ///
    /// # Errors
    /// Returns `Error::MalformedInfo` if the field is present but not an integer.
    pub fn get_u64(&self, name: &str) -> Result<u64> {
        self.get_u64_or(name, 0)
    }

    /// Unsigned counter with an explicit default for absent fields.
    ///
    /// # Errors
    /// Returns `Error::MalformedInfo` if the field is present but not an integer.
    pub fn get_u64_or(&self, name: &str, default: u64) -> Result<u64> {
        match self.raw(name) {
            None => Ok(default),
            Some(value) => value.parse::<u64>().map_err(|_| malformed(name, value)),
        }
    }

    /// Floating point gauge, `0.0` when absent.
    ///
    /// # Errors
    /// Returns `Error::MalformedInfo` if the field is present but not a number.
    pub fn get_f64(&self, name: &str) -> Result<f64> {
        match self.raw(name) {
            None => Ok(0.0),
            Some(value) => match value.parse::<f64>() {
                Ok(parsed) if parsed.is_finite() => Ok(parsed),
                _ => Err(malformed(name, value)),
            },
        }
    }

    /// Human-readable field, [`NOT_AVAILABLE`] when absent.
    pub fn get_str(&self, name: &str) -> String {
        self.raw(name).unwrap_or(NOT_AVAILABLE).to_string()
    }
}

fn malformed(name: &str, value: &str) -> Error {
    Error::MalformedInfo {
        field: name.to_string(),
        value: value.to_string(),
    }
}

impl FromIterator<(String, String)> for BackendInfo {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        BackendInfo {
            fields: iter.into_iter().collect(),
        }
    }
}
