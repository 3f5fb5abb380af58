//! Order route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use pampa_core::{OrderId, OrderStatus, UserId};

use super::{ApiJson, parse_path};
use crate::error::{AppError, Result};
use crate::gateway::{Gateway, GatewayError};
use crate::models::{Order, OrderFilter, OrderItem, OrderPatch};
use crate::state::AppState;

/// Order listing query parameters. Empty values mean "no filter".
#[derive(Debug, Default, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<String>,
    pub user_id: Option<String>,
}

impl OrderListQuery {
    fn into_filter(self) -> Result<OrderFilter> {
        let status = non_empty(self.status)
            .map(|raw| raw.parse::<OrderStatus>().map_err(AppError::BadRequest))
            .transpose()?;
        let user_id = non_empty(self.user_id)
            .map(|raw| parse_path::<UserId>(&raw, "user id"))
            .transpose()?;
        Ok(OrderFilter { status, user_id })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// List orders, newest first.
#[instrument(skip(state))]
pub async fn index<G: Gateway>(
    State(state): State<AppState<G>>,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<Vec<Order>>> {
    let filter = query.into_filter()?;
    let orders = state.gateway().list_orders(filter).await?;
    Ok(Json(orders))
}

/// Fetch one order.
#[instrument(skip(state))]
pub async fn show<G: Gateway>(
    State(state): State<AppState<G>>,
    Path(id): Path<String>,
) -> Result<Json<Order>> {
    let id: OrderId = parse_path(&id, "order id")?;
    let order = state
        .gateway()
        .get_order(id)
        .await?
        .ok_or_else(|| GatewayError::NotFound(format!("order {id}")))?;
    Ok(Json(order))
}

/// Apply a partial update (status and/or shipping address).
#[instrument(skip(state, patch))]
pub async fn update<G: Gateway>(
    State(state): State<AppState<G>>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<OrderPatch>,
) -> Result<Json<Order>> {
    let id: OrderId = parse_path(&id, "order id")?;
    if let Some(address) = &patch.shipping_address {
        address
            .validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
    }

    let order = state
        .gateway()
        .update_order(id, patch)
        .await?
        .ok_or_else(|| GatewayError::NotFound(format!("order {id}")))?;
    tracing::info!(order_id = %id, status = %order.status, "Order updated");
    Ok(Json(order))
}

/// Delete an order and its lines.
#[instrument(skip(state))]
pub async fn destroy<G: Gateway>(
    State(state): State<AppState<G>>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let id: OrderId = parse_path(&id, "order id")?;
    if !state.gateway().delete_order(id).await? {
        tracing::debug!(order_id = %id, "Delete matched no order");
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Lines of one order.
#[instrument(skip(state))]
pub async fn items<G: Gateway>(
    State(state): State<AppState<G>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<OrderItem>>> {
    let id: OrderId = parse_path(&id, "order id")?;
    let items = state.gateway().list_order_items(id).await?;
    Ok(Json(items))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_query_values_are_ignored() {
        let filter = OrderListQuery {
            status: Some(String::new()),
            user_id: Some("  ".to_string()),
        }
        .into_filter()
        .unwrap();
        assert_eq!(filter, OrderFilter::default());
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let result = OrderListQuery {
            status: Some("refunded".to_string()),
            user_id: None,
        }
        .into_filter();
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_status_filter_is_parsed() {
        let filter = OrderListQuery {
            status: Some("shipped".to_string()),
            user_id: None,
        }
        .into_filter()
        .unwrap();
        assert_eq!(filter.status, Some(OrderStatus::Shipped));
    }
}
