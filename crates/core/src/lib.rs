//! Winkel Core - Shared domain types.
//!
//! This crate provides the types used across all Winkel components:
//! - `storefront` - Session, cart and remote API client library
//! - `cli` - The `winkel` terminal storefront
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no storage,
//! no HTTP clients. Everything that validates on construction also validates
//! on deserialization, so a value of one of these types is always well-formed
//! no matter where it came from.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, quantities and emails, plus
//!   the user, cart, address, catalog and order models

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
