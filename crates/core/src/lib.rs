//! Pampa & Poeira Core - Shared types library.
//!
//! This crate provides common types used across all storefront components:
//! - `storefront` - REST API, cart store and order placement
//! - `cli` - Command-line tools for migrations and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, money, order statuses, shipping addresses and
//!   catalog constants

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
