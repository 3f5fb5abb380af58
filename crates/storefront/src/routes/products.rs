//! Product route handlers.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use tracing::instrument;

use pampa_core::ProductId;

use super::{ApiJson, parse_path};
use crate::error::{AppError, Result};
use crate::gateway::{Gateway, GatewayError};
use crate::models::{NewProduct, Product, ProductFilter, ProductPatch};
use crate::state::AppState;

/// Most images accepted in one upload request.
pub const MAX_IMAGES_PER_UPLOAD: usize = 5;

/// Response for an image upload.
#[derive(Debug, Serialize)]
pub struct UploadedImages {
    pub urls: Vec<String>,
}

/// List every product, newest first.
#[instrument(skip(state))]
pub async fn index<G: Gateway>(State(state): State<AppState<G>>) -> Result<Json<Vec<Product>>> {
    let products = state.gateway().list_products(ProductFilter::all()).await?;
    Ok(Json(products))
}

/// Fetch one product.
#[instrument(skip(state))]
pub async fn show<G: Gateway>(
    State(state): State<AppState<G>>,
    Path(id): Path<String>,
) -> Result<Json<Product>> {
    let id: ProductId = parse_path(&id, "product id")?;
    let product = state
        .gateway()
        .get_product(&id)
        .await?
        .ok_or_else(|| GatewayError::NotFound(format!("product {id}")))?;
    Ok(Json(product))
}

/// Create a product. A blank `id` gets a generated one.
#[instrument(skip(state, product), fields(name = %product.name))]
pub async fn create<G: Gateway>(
    State(state): State<AppState<G>>,
    ApiJson(product): ApiJson<NewProduct>,
) -> Result<impl IntoResponse> {
    product.validate().map_err(AppError::BadRequest)?;
    let id = product
        .resolve_id()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let created = state.gateway().create_product(id, product).await?;
    tracing::info!(product_id = %created.id, "Product created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update the fields present in the body.
#[instrument(skip(state, patch))]
pub async fn update<G: Gateway>(
    State(state): State<AppState<G>>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<ProductPatch>,
) -> Result<Json<Product>> {
    let id: ProductId = parse_path(&id, "product id")?;
    patch.validate().map_err(AppError::BadRequest)?;

    let product = state
        .gateway()
        .update_product(&id, patch)
        .await?
        .ok_or_else(|| GatewayError::NotFound(format!("product {id}")))?;
    Ok(Json(product))
}

/// Delete a product. Deleting an unknown id is not an error.
#[instrument(skip(state))]
pub async fn destroy<G: Gateway>(
    State(state): State<AppState<G>>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let id: ProductId = parse_path(&id, "product id")?;
    if !state.gateway().delete_product(&id).await? {
        tracing::debug!(product_id = %id, "Delete matched no product");
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Upload up to five images for a product and return their public URLs.
///
/// The product row is not modified; the admin picks `imagens` and
/// `imagem_principal` with a follow-up update.
#[instrument(skip(state, multipart))]
pub async fn upload_images<G: Gateway>(
    State(state): State<AppState<G>>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let id: ProductId = parse_path(&id, "product id")?;
    if state.gateway().get_product(&id).await?.is_none() {
        return Err(GatewayError::NotFound(format!("product {id}")).into());
    }

    let mut urls = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let Some(filename) = field.file_name().map(String::from) else {
            continue;
        };
        if urls.len() == MAX_IMAGES_PER_UPLOAD {
            return Err(AppError::BadRequest(format!(
                "at most {MAX_IMAGES_PER_UPLOAD} images per upload"
            )));
        }
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        if !content_type.starts_with("image/") {
            return Err(AppError::BadRequest(format!(
                "'{filename}' is not an image ({content_type})"
            )));
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        let url = state
            .storage()
            .upload_product_image(&id, &filename, &content_type, bytes.to_vec())
            .await?;
        urls.push(url);
    }

    if urls.is_empty() {
        return Err(AppError::BadRequest("no image files in request".to_string()));
    }

    tracing::info!(product_id = %id, count = urls.len(), "Product images uploaded");
    Ok((StatusCode::CREATED, Json(UploadedImages { urls })))
}
