//! Catalog and account administration.
//!
//! All commands need an administrator session; they are refused locally
//! otherwise.

use winkel_core::{ItemId, UserId};
use winkel_storefront::api::{ItemUpdate, NewItem, UserUpdate};
use winkel_storefront::error::Result;
use winkel_storefront::state::AppState;

use crate::render;

pub async fn create_item(state: &mut AppState, item: &NewItem) -> Result<()> {
    let created = state.create_item(item).await?;
    tracing::info!(item_id = %created.id, "item created");
    render::message("Item created.");
    render::item(&created);
    Ok(())
}

pub async fn update_item(state: &mut AppState, id: &ItemId, update: &ItemUpdate) -> Result<()> {
    let updated = state.update_item(id, update).await?;
    tracing::info!(item_id = %updated.id, "item updated");
    render::message("Item updated.");
    render::item(&updated);
    Ok(())
}

pub async fn delete_item(state: &mut AppState, id: &ItemId) -> Result<()> {
    state.delete_item(id).await?;
    tracing::info!(item_id = %id, "item deleted");
    render::message(&format!("Item {id} deleted."));
    Ok(())
}

pub async fn users(state: &mut AppState) -> Result<()> {
    let users = state.users().await?;
    render::users(&users);
    Ok(())
}

pub async fn show_user(state: &mut AppState, id: &UserId) -> Result<()> {
    let user = state.user(id).await?;
    render::user(&user);
    Ok(())
}

pub async fn update_user(state: &mut AppState, id: &UserId, update: &UserUpdate) -> Result<()> {
    let updated = state.update_user(id, update).await?;
    tracing::info!(user_id = %updated.id, "user updated");
    render::message("User updated.");
    render::user(&updated);
    Ok(())
}

pub async fn delete_user(state: &mut AppState, id: &UserId) -> Result<()> {
    state.delete_user(id).await?;
    tracing::info!(user_id = %id, "user deleted");
    render::message(&format!("User {id} deleted."));
    if !state.session().is_authenticated() {
        render::message("That was your own account; you are now logged out.");
    }
    Ok(())
}
