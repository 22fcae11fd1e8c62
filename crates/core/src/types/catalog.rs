//! Catalog item as listed by the remote API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::ItemId;
use super::price::Price;

/// A product in the shop's catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Price,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub stock: i64,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, with = "super::timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "super::timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
}

const fn default_active() -> bool {
    true
}

impl CatalogItem {
    /// Whether the item can currently be ordered.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.is_active && self.stock > 0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_api_item() {
        let item: CatalogItem = serde_json::from_str(
            r#"{
                "id": "5b0f6c7e-8d1a-4c55-9a51-1f0e3c2d4b6a",
                "name": "Pikachu Plush",
                "description": null,
                "price": 12.5,
                "image_url": null,
                "category": "plush",
                "stock": 3,
                "is_active": true,
                "created_at": "2025-01-01T10:00:00.123456",
                "updated_at": null
            }"#,
        )
        .unwrap();
        assert_eq!(item.price, Price::from_cents(1250).unwrap());
        assert!(item.is_available());
        assert!(item.created_at.is_some());
    }

    #[test]
    fn test_out_of_stock_is_unavailable() {
        let item: CatalogItem =
            serde_json::from_str(r#"{"id":"x","name":"X","price":1,"stock":0}"#).unwrap();
        assert!(item.is_active);
        assert!(!item.is_available());
    }
}
