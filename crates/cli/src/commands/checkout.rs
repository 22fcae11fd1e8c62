//! Placing an order.

use winkel_core::AddressForm;
use winkel_storefront::checkout::{CheckoutError, prepare_order};
use winkel_storefront::error::Result;
use winkel_storefront::state::AppState;

use crate::render;

/// Validate locally, warn about changed prices, then submit the order.
///
/// The order uses the prices shown in the cart even when the catalog has
/// changed since.
pub async fn place_order(state: &mut AppState, form: &AddressForm) -> Result<()> {
    if !state.session().is_authenticated() {
        return Err(CheckoutError::NotAuthenticated.into());
    }
    prepare_order(state.cart().cart(), form)?;

    match state.price_drift().await {
        Ok(drift) if !drift.is_empty() => render::price_drift(&drift),
        Ok(_) => {}
        Err(e) => tracing::warn!(error = %e, "could not compare cart prices with the catalog"),
    }

    let order = state.checkout(form).await?;
    render::message("Thank you for your order!");
    render::order(&order);
    Ok(())
}
