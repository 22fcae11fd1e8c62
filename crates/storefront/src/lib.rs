//! Winkel storefront library.
//!
//! Client-side state for the Winkel shop: the logged-in session, the
//! shopping cart, their durable copies in a profile directory, and the HTTP
//! client for the shop API. [`state::AppState`] ties them together for the
//! views.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod persistence;
pub mod session;
pub mod state;
