//! Core types for Winkel.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod cart;
pub mod catalog;
pub mod email;
pub mod id;
pub mod order;
pub mod price;
pub mod quantity;
pub mod status;
pub mod timestamp;
pub mod user;

pub use address::{Address, AddressError, AddressField, AddressForm, DEFAULT_COUNTRY};
pub use cart::{Cart, CartLine, DuplicateLine, ItemRef};
pub use catalog::CatalogItem;
pub use email::{Email, EmailError};
pub use id::*;
pub use order::{Order, OrderLine};
pub use price::{Price, PriceError};
pub use quantity::{Quantity, QuantityError};
pub use status::OrderStatus;
pub use user::User;
