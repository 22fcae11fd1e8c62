//! Cart commands. Everything except `add` works offline.

use winkel_core::ItemId;
use winkel_storefront::error::Result;
use winkel_storefront::state::AppState;

use crate::render;

pub fn show(state: &AppState) {
    render::cart(state.cart());
}

/// Look the item up in the catalog and add one unit.
pub async fn add(state: &mut AppState, id: &ItemId) -> Result<()> {
    let quantity = state.add_catalog_item_to_cart(id).await?;
    if let Some(line) = state.cart().line(id) {
        render::message(&format!("{} in cart: {quantity}", line.name));
    }
    render::cart_summary(state.cart());
    Ok(())
}

pub fn set(state: &mut AppState, id: &ItemId, quantity: i64) -> Result<()> {
    state.set_cart_quantity(id, quantity)?;
    render::cart(state.cart());
    Ok(())
}

pub fn remove(state: &mut AppState, id: &ItemId) -> Result<()> {
    state.remove_from_cart(id)?;
    render::cart(state.cart());
    Ok(())
}

pub fn clear(state: &mut AppState) {
    state.clear_cart();
    render::message("Cart cleared.");
}
