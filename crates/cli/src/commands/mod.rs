//! Command implementations. Each takes the application state, performs one
//! storefront operation and renders the result.

pub mod account;
pub mod admin;
pub mod cart;
pub mod checkout;
pub mod items;
pub mod orders;
