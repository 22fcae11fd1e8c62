//! Cart manager: the in-memory [`Cart`] plus its persisted copy.

use rust_decimal::Decimal;

use winkel_core::{Cart, CartLine, ItemId, ItemRef, Quantity, QuantityError};

use crate::persistence::{Persistence, StorageKey};

/// Owns the cart and writes it through to storage after every change.
#[derive(Debug)]
pub struct CartManager {
    persistence: Persistence,
    cart: Cart,
}

impl CartManager {
    /// An empty cart. Storage is not read; see [`CartManager::restore`].
    #[must_use]
    pub const fn new(persistence: Persistence) -> Self {
        Self {
            persistence,
            cart: Cart::new(),
        }
    }

    /// A manager initialized from whatever storage holds.
    #[must_use]
    pub fn restored(persistence: Persistence) -> Self {
        let mut manager = Self::new(persistence);
        manager.restore();
        manager
    }

    /// Replace the in-memory cart with the persisted one.
    ///
    /// Absent or undecodable data yields an empty cart.
    pub fn restore(&mut self) {
        self.cart = self
            .persistence
            .load::<Cart>(StorageKey::Cart)
            .unwrap_or_default();
        tracing::debug!(
            lines = self.cart.len(),
            items = self.cart.item_count(),
            "cart restored"
        );
    }

    /// Add one unit of `item` and return the line's new quantity.
    pub fn add_item(&mut self, item: ItemRef) -> Quantity {
        let id = item.id.clone();
        let quantity = self.cart.add(item);
        tracing::debug!(item_id = %id, quantity = quantity.get(), "added to cart");
        self.persist();
        quantity
    }

    /// Set the quantity of the line for `id`; zero or less removes it.
    ///
    /// Returns whether the cart changed. Unknown ids leave the cart as is.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::TooLarge`] for a quantity a line cannot hold.
    pub fn update_quantity(&mut self, id: &ItemId, quantity: i64) -> Result<bool, QuantityError> {
        let changed = self.cart.set_quantity(id, quantity)?;
        if changed {
            tracing::debug!(item_id = %id, quantity, "cart quantity updated");
            self.persist();
        }
        Ok(changed)
    }

    /// Remove the line for `id`, returning it if it existed.
    pub fn remove_item(&mut self, id: &ItemId) -> Option<CartLine> {
        let removed = self.cart.remove(id);
        if removed.is_some() {
            tracing::debug!(item_id = %id, "removed from cart");
            self.persist();
        }
        removed
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.cart.clear();
        tracing::debug!("cart cleared");
        self.persist();
    }

    #[must_use]
    pub fn total(&self) -> Decimal {
        self.cart.total()
    }

    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.cart.item_count()
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        self.cart.lines()
    }

    #[must_use]
    pub fn line(&self, id: &ItemId) -> Option<&CartLine> {
        self.cart.line(id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cart.is_empty()
    }

    fn persist(&self) {
        self.persistence.save(StorageKey::Cart, &self.cart);
    }
}
