//! Pampa & Poeira storefront library.
//!
//! REST API over the catalog, carts and orders, plus the cart store and
//! order placement workflow used by the session-scoped routes. The binary
//! wires it to `PostgreSQL`; tests wire it to an in-memory gateway.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    routing::get,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tower_sessions::SessionStore;

use crate::gateway::Gateway;
use crate::state::AppState;

/// Build the full application router.
///
/// `store` backs the session layer. Sentry layers are added by the binary.
pub fn build_router<G, S>(state: AppState<G>, store: S) -> Router
where
    G: Gateway,
    S: SessionStore + Clone,
{
    let session_layer = middleware::create_session_layer(store, state.config().is_secure());

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness::<G>))
        .merge(routes::routes())
        .layer(session_layer)
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the data store is not reachable.
async fn readiness<G: Gateway>(State(state): State<AppState<G>>) -> StatusCode {
    match state.gateway().ping().await {
        Ok(()) => StatusCode::OK,
        Err(err) => {
            tracing::warn!(error = %err, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
