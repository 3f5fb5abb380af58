//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `cart` - The signed-in user's cart and its running total
//! - `checkout` - Turning a cart into an order
//! - `identity` - Access token verification against the identity provider
//! - `storage` - Product image uploads to object storage

pub mod cart;
pub mod checkout;
pub mod identity;
pub mod storage;
