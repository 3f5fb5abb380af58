//! Core types for the storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod catalog;
pub mod id;
pub mod price;
pub mod status;

pub use address::{AddressError, ShippingAddress};
pub use catalog::{CATEGORIES, COLOR_PALETTE, Color, SIZES, is_palette_color};
pub use id::*;
pub use price::{Money, MoneyError};
pub use status::*;
