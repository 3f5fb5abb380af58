//! Domain models for the storefront.
//!
//! Field names on the wire follow the shop's original column names
//! (`nome`, `preco`, `tamanhos`, ...) so existing clients keep working.

pub mod cart;
pub mod order;
pub mod product;
pub mod session;

pub use cart::{CartItem, CartLine, NewCartItem};
pub use order::{NewOrder, NewOrderItem, Order, OrderFilter, OrderItem, OrderPatch};
pub use product::{NewProduct, Product, ProductFilter, ProductOrder, ProductPatch};
pub use session::{CurrentUser, keys as session_keys};

use serde::{Deserialize, Deserializer};

/// Deserialize a field that distinguishes "absent" from "explicitly null".
///
/// Use with `#[serde(default, deserialize_with = "double_option")]`:
/// absent gives `None`, `null` gives `Some(None)`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
