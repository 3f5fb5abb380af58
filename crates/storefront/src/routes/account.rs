//! Signed-in user routes: the session cart, checkout and order history.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use pampa_core::{CartItemId, Money, OrderId, ProductId, ShippingAddress};

use super::{ApiJson, parse_path};
use crate::error::Result;
use crate::gateway::Gateway;
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::{CartItem, CurrentUser, Order, OrderFilter};
use crate::services::cart::{CartError, CartStore};
use crate::services::checkout::{CheckoutError, OrderPlacement};
use crate::state::AppState;

/// Session cart as returned to the browser.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub total: Money,
}

/// Body of `POST /api/me/cart`.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    pub quantity: u32,
    pub size: String,
    pub color: String,
}

/// Body of `PUT /api/me/cart/{item_id}`.
#[derive(Debug, Deserialize)]
pub struct QuantityRequest {
    pub quantity: u32,
}

/// Body of `POST /api/checkout`.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub shipping_address: ShippingAddress,
}

/// Response of a successful checkout.
#[derive(Debug, Serialize)]
pub struct PlacedOrder {
    pub order_id: OrderId,
}

type SessionCart<G> = CartStore<G, Option<CurrentUser>>;

async fn load_cart<G: Gateway>(
    state: &AppState<G>,
    user: Option<CurrentUser>,
) -> Result<SessionCart<G>> {
    let mut cart = CartStore::new(state.gateway().clone(), user);
    cart.load().await?;
    Ok(cart)
}

fn view<G: Gateway>(cart: &SessionCart<G>) -> CartView {
    CartView {
        items: cart.items().to_vec(),
        total: cart.total(),
    }
}

/// The session cart and its total. Guests get an empty cart.
#[instrument(skip(state, user))]
pub async fn cart<G: Gateway>(
    State(state): State<AppState<G>>,
    OptionalAuth(user): OptionalAuth,
) -> Result<Json<CartView>> {
    let cart = load_cart(&state, user).await?;
    Ok(Json(view(&cart)))
}

/// Add a line to the session cart.
#[instrument(skip(state, user, body), fields(product_id = %body.product_id))]
pub async fn add_to_cart<G: Gateway>(
    State(state): State<AppState<G>>,
    OptionalAuth(user): OptionalAuth,
    ApiJson(body): ApiJson<AddToCartRequest>,
) -> Result<impl IntoResponse> {
    if user.is_none() {
        return Err(CartError::AuthenticationRequired.into());
    }
    let product = state
        .gateway()
        .get_product(&body.product_id)
        .await?
        .ok_or_else(|| {
            CartError::Validation(format!("product {} does not exist", body.product_id))
        })?;

    let mut cart = load_cart(&state, user).await?;
    cart.add_item(&product, body.quantity, &body.size, &body.color)
        .await?;
    Ok((StatusCode::CREATED, Json(view(&cart))))
}

/// Change the quantity of one of the user's lines.
#[instrument(skip(state, user, body))]
pub async fn update_cart_item<G: Gateway>(
    State(state): State<AppState<G>>,
    OptionalAuth(user): OptionalAuth,
    Path(item_id): Path<String>,
    ApiJson(body): ApiJson<QuantityRequest>,
) -> Result<Json<CartView>> {
    let item_id: CartItemId = parse_path(&item_id, "cart item id")?;
    let mut cart = load_cart(&state, user).await?;
    cart.update_quantity(item_id, body.quantity).await?;
    Ok(Json(view(&cart)))
}

/// Remove one of the user's lines.
#[instrument(skip(state, user))]
pub async fn remove_cart_item<G: Gateway>(
    State(state): State<AppState<G>>,
    OptionalAuth(user): OptionalAuth,
    Path(item_id): Path<String>,
) -> Result<Json<CartView>> {
    let item_id: CartItemId = parse_path(&item_id, "cart item id")?;
    let mut cart = load_cart(&state, user).await?;
    cart.remove_item(item_id).await?;
    Ok(Json(view(&cart)))
}

/// Empty the session cart.
#[instrument(skip(state, user))]
pub async fn clear_cart<G: Gateway>(
    State(state): State<AppState<G>>,
    OptionalAuth(user): OptionalAuth,
) -> Result<StatusCode> {
    let mut cart = CartStore::new(state.gateway().clone(), user);
    cart.clear().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Place an order for the session cart.
#[instrument(skip(state, user, body))]
pub async fn checkout<G: Gateway>(
    State(state): State<AppState<G>>,
    OptionalAuth(user): OptionalAuth,
    ApiJson(body): ApiJson<CheckoutRequest>,
) -> Result<impl IntoResponse> {
    if user.is_none() {
        return Err(CheckoutError::AuthenticationRequired.into());
    }
    let mut cart = load_cart(&state, user).await?;
    let order_id = OrderPlacement::new(&mut cart)
        .place_order(body.shipping_address)
        .await?;
    Ok((StatusCode::CREATED, Json(PlacedOrder { order_id })))
}

/// The signed-in user's orders, newest first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn orders<G: Gateway>(
    State(state): State<AppState<G>>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    let orders = state
        .gateway()
        .list_orders(OrderFilter::for_user(user.id))
        .await?;
    Ok(Json(orders))
}
