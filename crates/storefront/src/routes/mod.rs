//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                       - Liveness
//! GET  /health/ready                 - Readiness (data store round trip)
//!
//! # Catalog
//! GET    /api/produtos               - List products
//! POST   /api/produtos               - Create product
//! GET    /api/produtos/{id}          - Fetch product
//! PUT    /api/produtos/{id}          - Update product
//! DELETE /api/produtos/{id}          - Delete product
//! POST   /api/produtos/{id}/imagens  - Upload product images (multipart)
//! GET    /api/nova-colecao           - New collection
//! GET    /api/featured               - Top 4 featured products
//! GET    /api/loja                   - Shop listing
//!
//! # Orders
//! GET    /api/orders?status=&user_id= - List orders
//! GET    /api/orders/{id}            - Fetch order
//! PUT    /api/orders/{id}            - Update order
//! DELETE /api/orders/{id}            - Delete order
//! GET    /api/orders/{id}/items      - Order lines
//!
//! # Cart (by explicit user id)
//! GET    /api/cart/{user_id}         - Lines joined with products
//! POST   /api/cart                   - Add line
//! PUT    /api/cart/{item_id}         - Update quantity
//! DELETE /api/cart/{item_id}         - Remove line
//! DELETE /api/cart/user/{user_id}    - Clear cart
//!
//! # Session
//! POST   /api/auth/session           - Sign in with an access token
//! GET    /api/auth/session           - Current user
//! DELETE /api/auth/session           - Sign out
//!
//! # Signed-in user
//! GET    /api/me/cart                - Cart and total
//! POST   /api/me/cart                - Add line
//! DELETE /api/me/cart                - Clear cart
//! PUT    /api/me/cart/{item_id}      - Update quantity
//! DELETE /api/me/cart/{item_id}      - Remove line
//! POST   /api/checkout               - Place order
//! GET    /api/me/orders              - Order history
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod collections;
pub mod orders;
pub mod products;

use std::fmt::Display;
use std::str::FromStr;

use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRequest},
    routing::{get, post, put},
};

use crate::error::AppError;
use crate::gateway::Gateway;
use crate::state::AppState;

/// Largest accepted image upload request.
const UPLOAD_BODY_LIMIT: usize = 10 * 1024 * 1024;

/// JSON body extractor whose rejections use the API error format.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Parse a path segment, answering 400 with a JSON body when it is malformed.
pub(crate) fn parse_path<T>(raw: &str, what: &str) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.parse()
        .map_err(|e| AppError::BadRequest(format!("invalid {what} '{raw}': {e}")))
}

/// Create the product routes router.
pub fn product_routes<G: Gateway>() -> Router<AppState<G>> {
    Router::new()
        .route(
            "/",
            get(products::index::<G>).post(products::create::<G>),
        )
        .route(
            "/{id}",
            get(products::show::<G>)
                .put(products::update::<G>)
                .delete(products::destroy::<G>),
        )
        .route(
            "/{id}/imagens",
            post(products::upload_images::<G>).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
}

/// Create the order routes router.
pub fn order_routes<G: Gateway>() -> Router<AppState<G>> {
    Router::new()
        .route("/", get(orders::index::<G>))
        .route(
            "/{id}",
            get(orders::show::<G>)
                .put(orders::update::<G>)
                .delete(orders::destroy::<G>),
        )
        .route("/{id}/items", get(orders::items::<G>))
}

/// Create the cart routes router.
pub fn cart_routes<G: Gateway>() -> Router<AppState<G>> {
    Router::new()
        .route("/", post(cart::add::<G>))
        .route(
            "/{id}",
            get(cart::show::<G>)
                .put(cart::update::<G>)
                .delete(cart::remove::<G>),
        )
        .route("/user/{user_id}", axum::routing::delete(cart::clear::<G>))
}

/// Create the signed-in user routes router.
pub fn account_routes<G: Gateway>() -> Router<AppState<G>> {
    Router::new()
        .route(
            "/cart",
            get(account::cart::<G>)
                .post(account::add_to_cart::<G>)
                .delete(account::clear_cart::<G>),
        )
        .route(
            "/cart/{item_id}",
            put(account::update_cart_item::<G>).delete(account::remove_cart_item::<G>),
        )
        .route("/orders", get(account::orders::<G>))
}

/// Create all API routes.
pub fn routes<G: Gateway>() -> Router<AppState<G>> {
    Router::new()
        .nest("/api/produtos", product_routes())
        .route("/api/nova-colecao", get(collections::new_collection::<G>))
        .route("/api/featured", get(collections::featured::<G>))
        .route("/api/loja", get(collections::shop::<G>))
        .nest("/api/orders", order_routes())
        .nest("/api/cart", cart_routes())
        .route(
            "/api/auth/session",
            get(auth::current)
                .post(auth::sign_in::<G>)
                .delete(auth::sign_out),
        )
        .nest("/api/me", account_routes())
        .route("/api/checkout", post(account::checkout::<G>))
}
