//! Cart route handlers addressed by explicit user id.
//!
//! These mirror the table-level cart calls for callers that manage the
//! user themselves. The session-scoped equivalents live in
//! [`super::account`].

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use pampa_core::{CartItemId, ProductId, UserId};

use super::{ApiJson, parse_path};
use crate::error::{AppError, Result};
use crate::gateway::{Gateway, GatewayError};
use crate::models::CartItem;
use crate::services::cart::{CartStore, validate_quantity};
use crate::state::AppState;

/// Body of `POST /api/cart`. Every field is required; they are optional here
/// so a missing one is answered with a JSON 400.
#[derive(Debug, Default, Deserialize)]
pub struct AddCartItemRequest {
    pub user_id: Option<UserId>,
    pub product_id: Option<String>,
    pub quantity: Option<u32>,
    pub size: Option<String>,
    pub color: Option<String>,
}

/// Body of `PUT /api/cart/{item_id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: Option<u32>,
}

/// Lines of a user's cart, each joined with its product.
#[instrument(skip(state))]
pub async fn show<G: Gateway>(
    State(state): State<AppState<G>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<CartItem>>> {
    let user_id: UserId = parse_path(&user_id, "user id")?;
    let mut cart = CartStore::new(state.gateway().clone(), user_id);
    cart.load().await?;
    Ok(Json(cart.items().to_vec()))
}

/// Add a line to a user's cart.
#[instrument(skip(state, body))]
pub async fn add<G: Gateway>(
    State(state): State<AppState<G>>,
    ApiJson(body): ApiJson<AddCartItemRequest>,
) -> Result<impl IntoResponse> {
    let AddCartItemRequest {
        user_id: Some(user_id),
        product_id: Some(product_id),
        quantity: Some(quantity),
        size: Some(size),
        color: Some(color),
    } = body
    else {
        return Err(AppError::BadRequest(
            "user_id, product_id, quantity, size and color are required".to_string(),
        ));
    };

    let product_id: ProductId = parse_path(&product_id, "product id")?;
    let product = state
        .gateway()
        .get_product(&product_id)
        .await?
        .ok_or_else(|| GatewayError::NotFound(format!("product {product_id}")))?;

    let mut cart = CartStore::new(state.gateway().clone(), user_id);
    let item = cart.add_item(&product, quantity, &size, &color).await?;
    Ok((StatusCode::CREATED, Json(item.line.clone())))
}

/// Set the quantity of a line.
#[instrument(skip(state, body))]
pub async fn update<G: Gateway>(
    State(state): State<AppState<G>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateQuantityRequest>,
) -> Result<StatusCode> {
    let id: CartItemId = parse_path(&id, "cart item id")?;
    let quantity = body
        .quantity
        .ok_or_else(|| AppError::BadRequest("quantity is required".to_string()))?;
    validate_quantity(quantity)?;

    if !state
        .gateway()
        .update_cart_item_quantity(id, quantity)
        .await?
    {
        return Err(GatewayError::NotFound(format!("cart item {id}")).into());
    }
    Ok(StatusCode::OK)
}

/// Remove a line. Removing an unknown line is not an error.
#[instrument(skip(state))]
pub async fn remove<G: Gateway>(
    State(state): State<AppState<G>>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let id: CartItemId = parse_path(&id, "cart item id")?;
    state.gateway().delete_cart_item(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Remove every line of a user's cart.
#[instrument(skip(state))]
pub async fn clear<G: Gateway>(
    State(state): State<AppState<G>>,
    Path(user_id): Path<String>,
) -> Result<StatusCode> {
    let user_id: UserId = parse_path(&user_id, "user id")?;
    let removed = state.gateway().clear_cart(user_id).await?;
    tracing::debug!(%user_id, removed, "Cart cleared");
    Ok(StatusCode::NO_CONTENT)
}
