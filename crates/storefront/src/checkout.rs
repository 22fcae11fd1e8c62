//! Turning a cart and an address form into an order request.

use rust_decimal::Decimal;
use thiserror::Error;

use winkel_core::{AddressError, AddressForm, Cart, CatalogItem, ItemId, Price};

use crate::api::{OrderLineRequest, OrderRequest};

/// Reasons a checkout is refused before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("you must be logged in to place an order")]
    NotAuthenticated,

    #[error("your cart is empty")]
    EmptyCart,

    #[error(transparent)]
    Address(#[from] AddressError),
}

/// Build the order request for `cart` shipped to `form`.
///
/// Lines carry the name and price captured when each item was added, not the
/// current catalog values.
///
/// # Errors
///
/// Returns `CheckoutError::EmptyCart` for an empty cart, or
/// `CheckoutError::Address` naming the first missing address field.
pub fn prepare_order(cart: &Cart, form: &AddressForm) -> Result<OrderRequest, CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    let address = form.validate()?;

    Ok(OrderRequest {
        items: cart.lines().iter().map(OrderLineRequest::from).collect(),
        address,
    })
}

/// A cart line whose price no longer matches the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceDrift {
    pub item_id: ItemId,
    pub name: String,
    pub in_cart: Price,
    pub in_catalog: Price,
}

impl PriceDrift {
    /// Catalog price minus cart price, per unit.
    #[must_use]
    pub fn difference(&self) -> Decimal {
        self.in_catalog.amount() - self.in_cart.amount()
    }
}

/// Cart lines whose snapshot price differs from `catalog`.
///
/// Items missing from the catalog are not reported.
#[must_use]
pub fn price_drift(cart: &Cart, catalog: &[CatalogItem]) -> Vec<PriceDrift> {
    cart.lines()
        .iter()
        .filter_map(|line| {
            let item = catalog.iter().find(|item| item.id == line.id)?;
            (item.price != line.price).then(|| PriceDrift {
                item_id: line.id.clone(),
                name: line.name.clone(),
                in_cart: line.price,
                in_catalog: item.price,
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use winkel_core::{AddressField, ItemRef};

    use super::*;

    fn item(id: &str, cents: i64) -> CatalogItem {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": format!("Item {id}"),
            "price": Decimal::new(cents, 2).to_string(),
            "stock": 10,
        }))
        .unwrap()
    }

    fn form() -> AddressForm {
        AddressForm {
            street: "Damrak".to_owned(),
            house_number: "1".to_owned(),
            postal_code: "1012 LG".to_owned(),
            city: "Amsterdam".to_owned(),
            country: String::new(),
        }
    }

    fn cart_with(items: &[&CatalogItem]) -> Cart {
        let mut cart = Cart::new();
        for item in items {
            cart.add(ItemRef::from(*item));
        }
        cart
    }

    #[test]
    fn test_prepare_order() {
        let pikachu = item("pikachu", 1250);
        let cart = cart_with(&[&pikachu, &pikachu]);

        let order = prepare_order(&cart, &form()).unwrap();
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].quantity, 2);
        assert_eq!(order.items[0].product_price, Decimal::new(1250, 2));
        assert_eq!(order.address.country, "Nederland");
    }

    #[test]
    fn test_missing_city_is_rejected() {
        let cart = cart_with(&[&item("a", 100)]);
        let form = AddressForm {
            city: "  ".to_owned(),
            ..form()
        };
        assert_eq!(
            prepare_order(&cart, &form),
            Err(CheckoutError::Address(AddressError::Missing(
                AddressField::City
            )))
        );
    }

    #[test]
    fn test_empty_cart_is_rejected_first() {
        assert_eq!(
            prepare_order(&Cart::new(), &AddressForm::default()),
            Err(CheckoutError::EmptyCart)
        );
    }

    #[test]
    fn test_price_drift() {
        let a = item("a", 1000);
        let b = item("b", 500);
        let cart = cart_with(&[&a, &b]);

        let catalog = [item("a", 1200), b.clone()];
        let drift = price_drift(&cart, &catalog);
        assert_eq!(drift.len(), 1);
        assert_eq!(drift[0].item_id.as_str(), "a");
        assert_eq!(drift[0].difference(), Decimal::new(200, 2));

        assert!(price_drift(&cart, &[]).is_empty());
    }
}
