//! Remote data gateway contract.
//!
//! The cart store, order placement and HTTP handlers reach the data store
//! only through these traits. [`crate::db::PgGateway`] is the production
//! implementation; tests plug in an in-memory one.
//!
//! Every call is a single table-scoped operation. Nothing here is retried.

use std::future::Future;

use thiserror::Error;

use pampa_core::{CartItemId, OrderId, ProductId, UserId};

use crate::models::{
    CartLine, CurrentUser, NewCartItem, NewOrder, NewOrderItem, NewProduct, Order, OrderFilter,
    OrderItem, OrderPatch, Product, ProductFilter, ProductPatch,
};

/// Errors raised by a gateway implementation.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the store does not fit the domain types.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested row was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Constraint violation (duplicate id, unknown product, ...).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The call did not complete within the configured timeout.
    #[error("{0} timed out")]
    Timeout(&'static str),

    /// The store refused or could not serve the call.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Read and admin write access to the product table.
pub trait CatalogGateway: Send + Sync {
    fn list_products(
        &self,
        filter: ProductFilter,
    ) -> impl Future<Output = Result<Vec<Product>, GatewayError>> + Send;

    fn get_product(
        &self,
        id: &ProductId,
    ) -> impl Future<Output = Result<Option<Product>, GatewayError>> + Send;

    /// Products whose id is in `ids`; unknown ids are skipped.
    fn products_by_ids(
        &self,
        ids: &[ProductId],
    ) -> impl Future<Output = Result<Vec<Product>, GatewayError>> + Send;

    fn create_product(
        &self,
        id: ProductId,
        product: NewProduct,
    ) -> impl Future<Output = Result<Product, GatewayError>> + Send;

    /// Returns `None` when no product has `id`.
    fn update_product(
        &self,
        id: &ProductId,
        patch: ProductPatch,
    ) -> impl Future<Output = Result<Option<Product>, GatewayError>> + Send;

    /// Returns whether a row was deleted.
    fn delete_product(
        &self,
        id: &ProductId,
    ) -> impl Future<Output = Result<bool, GatewayError>> + Send;
}

/// Access to persisted cart lines.
pub trait CartGateway: Send + Sync {
    /// Lines owned by `user_id`, oldest first.
    fn list_cart_items(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Vec<CartLine>, GatewayError>> + Send;

    fn insert_cart_item(
        &self,
        item: NewCartItem,
    ) -> impl Future<Output = Result<CartLine, GatewayError>> + Send;

    /// Returns whether a row was updated.
    fn update_cart_item_quantity(
        &self,
        id: CartItemId,
        quantity: u32,
    ) -> impl Future<Output = Result<bool, GatewayError>> + Send;

    /// Returns whether a row was deleted.
    fn delete_cart_item(
        &self,
        id: CartItemId,
    ) -> impl Future<Output = Result<bool, GatewayError>> + Send;

    /// Returns the number of rows deleted.
    fn clear_cart(&self, user_id: UserId)
    -> impl Future<Output = Result<u64, GatewayError>> + Send;
}

/// Access to orders and their lines.
pub trait OrderGateway: Send + Sync {
    /// Orders passing `filter`, newest first.
    fn list_orders(
        &self,
        filter: OrderFilter,
    ) -> impl Future<Output = Result<Vec<Order>, GatewayError>> + Send;

    fn get_order(
        &self,
        id: OrderId,
    ) -> impl Future<Output = Result<Option<Order>, GatewayError>> + Send;

    /// Insert a `pending` order header.
    fn create_order(
        &self,
        order: NewOrder,
    ) -> impl Future<Output = Result<Order, GatewayError>> + Send;

    /// Insert all lines in one statement: either every line is written or none.
    fn insert_order_items(
        &self,
        items: Vec<NewOrderItem>,
    ) -> impl Future<Output = Result<Vec<OrderItem>, GatewayError>> + Send;

    fn list_order_items(
        &self,
        order_id: OrderId,
    ) -> impl Future<Output = Result<Vec<OrderItem>, GatewayError>> + Send;

    /// Returns `None` when no order has `id`.
    fn update_order(
        &self,
        id: OrderId,
        patch: OrderPatch,
    ) -> impl Future<Output = Result<Option<Order>, GatewayError>> + Send;

    /// Delete an order header (its lines go with it). Returns whether a row was deleted.
    fn delete_order(&self, id: OrderId) -> impl Future<Output = Result<bool, GatewayError>> + Send;
}

/// The full data store as seen by the application.
pub trait Gateway:
    CatalogGateway + CartGateway + OrderGateway + Clone + Send + Sync + 'static
{
    /// Cheap round trip used by the readiness probe.
    fn ping(&self) -> impl Future<Output = Result<(), GatewayError>> + Send;
}

/// Source of the authenticated user for the current operation.
pub trait SessionProvider {
    /// The session user, or `None` when nobody is signed in.
    fn current_user_id(&self) -> Option<UserId>;
}

impl SessionProvider for Option<UserId> {
    fn current_user_id(&self) -> Option<UserId> {
        *self
    }
}

impl SessionProvider for UserId {
    fn current_user_id(&self) -> Option<UserId> {
        Some(*self)
    }
}

impl SessionProvider for Option<CurrentUser> {
    fn current_user_id(&self) -> Option<UserId> {
        self.as_ref().map(|user| user.id)
    }
}
