//! Core entity trait for records served from the cached collection.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::hash::Hash;

/// Trait for records the collection cache can hold.
///
/// The cache never inspects an entity beyond its identifier, which appears in
/// lifecycle events and log lines. Everything else only has to survive a
/// serde round trip.
///
/// # Example
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use property_cache::Entity;
///
/// #[derive(Clone, Serialize, Deserialize)]
/// pub struct Listing {
///     pub id: u64,
///     pub title: String,
/// }
///
/// impl Entity for Listing {
///     type Id = u64;
///
///     fn entity_id(&self) -> Self::Id {
///         self.id
///     }
///
///     fn entity_name() -> &'static str {
///         "listing"
///     }
/// }
/// ```
pub trait Entity: Send + Sync + Serialize + for<'de> Deserialize<'de> + Clone + 'static {
    /// Type of the entity's stable identifier.
    type Id: Display + Clone + Send + Sync + Eq + Hash + 'static;

    /// Return the entity's identifier.
    fn entity_id(&self) -> Self::Id;

    /// Human-readable model name used in log lines, e.g. "property".
    fn entity_name() -> &'static str;
}
