//! Order history.

use winkel_core::OrderId;
use winkel_storefront::error::Result;
use winkel_storefront::state::AppState;

use crate::render;

pub async fn list(state: &mut AppState) -> Result<()> {
    let orders = state.orders().await?;
    render::orders(&orders);
    Ok(())
}

pub async fn show(state: &mut AppState, id: &OrderId) -> Result<()> {
    let order = state.order(id).await?;
    render::order(&order);
    Ok(())
}
