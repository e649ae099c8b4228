//! The property listing model.

use crate::entity::Entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A rental/sale listing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub location: String,
    pub created_at: DateTime<Utc>,
}

impl Property {
    /// New property stamped with the current time.
    pub fn new(
        id: u64,
        title: impl Into<String>,
        description: impl Into<String>,
        price: f64,
        location: impl Into<String>,
    ) -> Self {
        Property {
            id,
            title: title.into(),
            description: description.into(),
            price,
            location: location.into(),
            created_at: Utc::now(),
        }
    }
}

impl Entity for Property {
    type Id = u64;

    fn entity_id(&self) -> Self::Id {
        self.id
    }

    fn entity_name() -> &'static str {
        "property"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::{decode, encode};

    #[test]
    fn test_property_identity() {
        let property = Property::new(7, "Loft", "Top floor", 1800.0, "Lisbon");
        assert_eq!(property.entity_id(), 7);
        assert_eq!(Property::entity_name(), "property");
    }

    #[test]
    fn test_property_survives_storage_encoding() {
        let listing = vec![
            Property::new(1, "Loft", "Top floor", 1800.0, "Lisbon"),
            Property::new(2, "Cabin", "Lakeside", 950.0, "Bled"),
        ];

        let decoded: Vec<Property> = decode(&encode(&listing).unwrap()).unwrap();
        assert_eq!(decoded, listing);
    }
}
