//! Curated product listings.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::error::Result;
use crate::gateway::Gateway;
use crate::models::{Product, ProductFilter};
use crate::state::AppState;

/// How many products the featured strip shows.
pub const FEATURED_LIMIT: u32 = 4;

/// Products flagged as part of the new collection, newest first.
#[instrument(skip(state))]
pub async fn new_collection<G: Gateway>(
    State(state): State<AppState<G>>,
) -> Result<Json<Vec<Product>>> {
    let products = state
        .gateway()
        .list_products(ProductFilter::new_collection())
        .await?;
    Ok(Json(products))
}

/// The newest featured products.
#[instrument(skip(state))]
pub async fn featured<G: Gateway>(State(state): State<AppState<G>>) -> Result<Json<Vec<Product>>> {
    let products = state
        .gateway()
        .list_products(ProductFilter::featured(FEATURED_LIMIT))
        .await?;
    Ok(Json(products))
}

/// The regular shop listing: everything outside the new collection.
#[instrument(skip(state))]
pub async fn shop<G: Gateway>(State(state): State<AppState<G>>) -> Result<Json<Vec<Product>>> {
    let products = state.gateway().list_products(ProductFilter::shop()).await?;
    Ok(Json(products))
}
