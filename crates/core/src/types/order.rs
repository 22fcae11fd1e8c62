//! Orders as returned by the remote API.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::address::Address;
use super::id::{OrderId, OrderLineId};
use super::price::Price;
use super::quantity::Quantity;
use super::status::OrderStatus;

/// A product line inside a placed order.
///
/// Name and price are the snapshot sent at checkout, not the current
/// catalog values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: OrderLineId,
    pub product_name: String,
    pub product_price: Price,
    pub quantity: Quantity,
}

impl OrderLine {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product_price.times(self.quantity)
    }
}

/// A placed order with its shipping address and lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    pub total_amount: Price,
    pub street: String,
    pub house_number: String,
    pub postal_code: String,
    pub city: String,
    pub country: String,
    #[serde(with = "super::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub items: Vec<OrderLine>,
}

impl Order {
    /// The shipping address, reassembled from the flattened fields.
    #[must_use]
    pub fn address(&self) -> Address {
        Address {
            street: self.street.clone(),
            house_number: self.house_number.clone(),
            postal_code: self.postal_code.clone(),
            city: self.city.clone(),
            country: self.country.clone(),
        }
    }

    /// Sum of the embedded lines. Normally equal to `total_amount`.
    #[must_use]
    pub fn lines_total(&self) -> Decimal {
        self.items.iter().map(OrderLine::line_total).sum()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items
            .iter()
            .map(|line| u64::from(line.quantity.get()))
            .sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const ORDER_JSON: &str = r#"{
        "id": "9d1c0e6a-0000-4000-8000-000000000001",
        "status": "pending",
        "total_amount": 47.5,
        "street": "Damrak",
        "house_number": "1",
        "postal_code": "1012 LG",
        "city": "Amsterdam",
        "country": "Nederland",
        "created_at": "2025-06-01T12:00:00.000001",
        "items": [
            {"id": "l-1", "product_name": "Pikachu Plush", "product_price": 12.5, "quantity": 2},
            {"id": "l-2", "product_name": "Poke Ball", "product_price": 7.5, "quantity": 3}
        ]
    }"#;

    #[test]
    fn test_deserialize_order() {
        let order: Order = serde_json::from_str(ORDER_JSON).unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.lines_total(), Decimal::new(4750, 2));
        assert_eq!(order.total_amount.amount(), order.lines_total());
        assert_eq!(order.item_count(), 5);
        assert_eq!(order.address().city, "Amsterdam");
    }
}
