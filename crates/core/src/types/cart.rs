//! Shopping cart model.
//!
//! The cart is an ordered list of lines keyed by item id. Two invariants hold
//! for every `Cart` value, including ones produced by deserialization:
//!
//! - at most one line per item id
//! - every line has a quantity of at least one
//!
//! Totals are derived on demand and never stored.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::catalog::CatalogItem;
use super::id::ItemId;
use super::price::Price;
use super::quantity::{Quantity, QuantityError};

/// The catalog attributes needed to put an item in the cart.
///
/// Quantity is not part of the reference: adding always means "one more".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRef {
    pub id: ItemId,
    pub name: String,
    pub price: Price,
    pub image_url: Option<String>,
}

impl From<&CatalogItem> for ItemRef {
    fn from(item: &CatalogItem) -> Self {
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            price: item.price,
            image_url: item.image_url.clone(),
        }
    }
}

/// One item's entry in the cart, with the display attributes captured when
/// it was first added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: ItemId,
    pub name: String,
    pub price: Price,
    pub quantity: Quantity,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl CartLine {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price.times(self.quantity)
    }
}

/// Error produced when a line list violates the cart invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("duplicate cart line for item {0}")]
pub struct DuplicateLine(pub ItemId);

/// An ordered collection of cart lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CartLine>", into = "Vec<CartLine>")]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Add one unit of `item`.
    ///
    /// If the id is already in the cart its quantity goes up by one and the
    /// other attributes of `item` are ignored. Otherwise a new line with
    /// quantity one is appended. Returns the line's resulting quantity.
    pub fn add(&mut self, item: ItemRef) -> Quantity {
        if let Some(line) = self.line_mut(&item.id) {
            line.quantity = line.quantity.incremented();
            return line.quantity;
        }

        self.lines.push(CartLine {
            id: item.id,
            name: item.name,
            price: item.price,
            quantity: Quantity::ONE,
            image_url: item.image_url,
        });
        Quantity::ONE
    }

    /// Set a line's quantity to exactly `quantity`.
    ///
    /// Zero or below removes the line. Unknown ids are ignored. Returns
    /// whether the cart changed.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::TooLarge`] if `quantity` does not fit a line;
    /// the cart is left unchanged.
    pub fn set_quantity(&mut self, id: &ItemId, quantity: i64) -> Result<bool, QuantityError> {
        match Quantity::new(quantity) {
            Ok(quantity) => Ok(match self.line_mut(id) {
                Some(line) if line.quantity != quantity => {
                    line.quantity = quantity;
                    true
                }
                _ => false,
            }),
            Err(QuantityError::NotPositive(_)) => Ok(self.remove(id).is_some()),
            Err(err @ QuantityError::TooLarge(_)) => Err(err),
        }
    }

    /// Remove the line for `id`, returning it if it was present.
    pub fn remove(&mut self, id: &ItemId) -> Option<CartLine> {
        let pos = self.lines.iter().position(|line| &line.id == id)?;
        Some(self.lines.remove(pos))
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of unit price times quantity over all lines.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lines
            .iter()
            .map(CartLine::line_total)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines
            .iter()
            .map(|line| u64::from(line.quantity.get()))
            .sum()
    }

    /// Lines in display order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// The line for `id`, if present.
    #[must_use]
    pub fn line(&self, id: &ItemId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.id == id)
    }

    /// Number of distinct items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn line_mut(&mut self, id: &ItemId) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|line| &line.id == id)
    }
}

impl TryFrom<Vec<CartLine>> for Cart {
    type Error = DuplicateLine;

    fn try_from(lines: Vec<CartLine>) -> Result<Self, Self::Error> {
        let mut seen = std::collections::HashSet::with_capacity(lines.len());
        for line in &lines {
            if !seen.insert(&line.id) {
                return Err(DuplicateLine(line.id.clone()));
            }
        }
        Ok(Self { lines })
    }
}

impl From<Cart> for Vec<CartLine> {
    fn from(cart: Cart) -> Self {
        cart.lines
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a CartLine;
    type IntoIter = std::slice::Iter<'a, CartLine>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(id: &str, cents: i64) -> ItemRef {
        ItemRef {
            id: ItemId::parse(id).unwrap(),
            name: id.replace('-', " "),
            price: Price::from_cents(cents).unwrap(),
            image_url: None,
        }
    }

    fn id(s: &str) -> ItemId {
        ItemId::parse(s).unwrap()
    }

    #[test]
    fn test_repeated_add_keeps_one_line() {
        let mut cart = Cart::new();
        for n in 1..=5 {
            let quantity = cart.add(item("pikachu-plush", 1250));
            assert_eq!(quantity.get(), n);
        }
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.line(&id("pikachu-plush")).unwrap().quantity.get(), 5);
    }

    #[test]
    fn test_add_ignores_differing_attributes() {
        let mut cart = Cart::new();
        cart.add(item("pikachu-plush", 1250));
        let mut changed = item("pikachu-plush", 9999);
        changed.name = "Other".to_owned();
        cart.add(changed);

        let line = cart.line(&id("pikachu-plush")).unwrap();
        assert_eq!(line.price, Price::from_cents(1250).unwrap());
        assert_eq!(line.name, "pikachu plush");
        assert_eq!(line.quantity.get(), 2);
    }

    #[test]
    fn test_add_appends_in_order() {
        let mut cart = Cart::new();
        cart.add(item("b", 100));
        cart.add(item("a", 100));
        cart.add(item("b", 100));
        let ids: Vec<_> = cart.lines().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
    }

    #[test]
    fn test_set_quantity_is_absolute() {
        let mut cart = Cart::new();
        cart.add(item("a", 100));
        cart.add(item("a", 100));
        assert!(cart.set_quantity(&id("a"), 3).unwrap());
        assert_eq!(cart.line(&id("a")).unwrap().quantity.get(), 3);
        assert!(!cart.set_quantity(&id("a"), 3).unwrap());
    }

    #[test]
    fn test_set_quantity_non_positive_removes() {
        let mut cart = Cart::new();
        cart.add(item("a", 100));
        cart.add(item("b", 100));
        assert!(cart.set_quantity(&id("a"), 0).unwrap());
        assert!(cart.set_quantity(&id("b"), -5).unwrap());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_unknown_is_noop() {
        let mut cart = Cart::new();
        cart.add(item("a", 100));
        assert!(!cart.set_quantity(&id("zzz"), 4).unwrap());
        assert!(!cart.set_quantity(&id("zzz"), 0).unwrap());
        assert_eq!(cart.item_count(), 1);
    }

    #[test]
    fn test_set_quantity_too_large_is_error() {
        let mut cart = Cart::new();
        cart.add(item("a", 100));
        assert_eq!(
            cart.set_quantity(&id("a"), 5_000_000_000),
            Err(QuantityError::TooLarge(5_000_000_000))
        );
        assert_eq!(cart.line(&id("a")).unwrap().quantity.get(), 1);
    }

    #[test]
    fn test_total_at_price_bound() {
        let mut cart = Cart::new();
        cart.add(ItemRef {
            price: Price::MAX,
            ..item("a", 0)
        });
        cart.add(ItemRef {
            price: Price::MAX,
            ..item("b", 0)
        });
        cart.set_quantity(&id("a"), i64::from(u32::MAX)).unwrap();
        cart.set_quantity(&id("b"), i64::from(u32::MAX)).unwrap();
        assert_eq!(
            cart.total(),
            Decimal::from(2_000_000_000_u64) * Decimal::from(u32::MAX)
        );
    }

    #[test]
    fn test_remove() {
        let mut cart = Cart::new();
        cart.add(item("a", 100));
        assert!(cart.remove(&id("missing")).is_none());
        assert_eq!(cart.remove(&id("a")).unwrap().id.as_str(), "a");
        assert!(cart.is_empty());
    }

    #[test]
    fn test_pikachu_scenario() {
        let mut cart = Cart::new();
        cart.add(item("pikachu-plush", 1250));
        cart.add(item("pikachu-plush", 1250));
        assert_eq!(cart.total(), Decimal::new(2500, 2));
        assert_eq!(cart.item_count(), 2);

        cart.set_quantity(&id("pikachu-plush"), 1).unwrap();
        assert_eq!(cart.total(), Decimal::new(1250, 2));
        assert_eq!(cart.item_count(), 1);

        cart.remove(&id("pikachu-plush"));
        assert_eq!(cart.total(), Decimal::ZERO);
        assert_eq!(cart.item_count(), 0);
    }

    #[test]
    fn test_total_two_items() {
        let mut cart = Cart::new();
        cart.add(item("a", 1250));
        cart.add(item("b", 750));
        cart.set_quantity(&id("a"), 2).unwrap();
        cart.set_quantity(&id("b"), 3).unwrap();
        assert_eq!(cart.total(), Decimal::new(4750, 2));
        assert_eq!(cart.item_count(), 5);
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add(item("a", 1250));
        cart.add(item("b", 750));
        cart.clear();
        assert_eq!(cart.item_count(), 0);
        assert_eq!(cart.total(), Decimal::ZERO);
    }

    #[test]
    fn test_deserialize_rejects_duplicates() {
        let json = r#"[
            {"id":"a","name":"A","price":"1.00","quantity":1},
            {"id":"a","name":"A","price":"1.00","quantity":2}
        ]"#;
        assert!(serde_json::from_str::<Cart>(json).is_err());
    }

    #[test]
    fn test_deserialize_rejects_zero_quantity() {
        let json = r#"[{"id":"a","name":"A","price":"1.00","quantity":0}]"#;
        assert!(serde_json::from_str::<Cart>(json).is_err());
    }

    #[test]
    fn test_serialized_shape() {
        let mut cart = Cart::new();
        cart.add(item("a", 1250));
        let value = serde_json::to_value(&cart).unwrap();
        assert_eq!(
            value,
            serde_json::json!([{
                "id": "a",
                "name": "a",
                "price": "12.50",
                "quantity": 1,
                "image_url": null
            }])
        );
    }
}
