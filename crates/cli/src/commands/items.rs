//! Catalog browsing.

use winkel_core::ItemId;
use winkel_storefront::error::Result;
use winkel_storefront::state::AppState;

use crate::render;

const DEFAULT_PAGE_SIZE: u32 = 100;

/// List active items, optionally one page at a time.
pub async fn list(state: &AppState, skip: Option<u32>, limit: Option<u32>) -> Result<()> {
    let items = if skip.is_none() && limit.is_none() {
        state.catalog().await?
    } else {
        state
            .api()
            .list_items_page(skip.unwrap_or(0), limit.unwrap_or(DEFAULT_PAGE_SIZE))
            .await?
    };
    render::items(&items);
    Ok(())
}

pub async fn show(state: &AppState, id: &ItemId) -> Result<()> {
    let item = state.item(id).await?;
    render::item(&item);
    Ok(())
}
