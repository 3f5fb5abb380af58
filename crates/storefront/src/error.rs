//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding to the client. Every response body is JSON of
//! the form `{"error": "<message>"}`.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::gateway::GatewayError;
use crate::services::cart::CartError;
use crate::services::checkout::CheckoutError;
use crate::services::identity::IdentityError;
use crate::services::storage::StorageError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Data store call failed.
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Object storage call failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Identity provider call failed.
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Order placement failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Gateway(err)
            | Self::Cart(CartError::Store(err))
            | Self::Checkout(CheckoutError::Store(err)) => {
                gateway_status(err)
            }
            Self::Cart(CartError::AuthenticationRequired)
            | Self::Checkout(CheckoutError::AuthenticationRequired)
            | Self::Identity(IdentityError::InvalidToken)
            | Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Cart(CartError::Validation(_))
            | Self::Checkout(CheckoutError::Validation(_))
            | Self::Storage(_)
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Checkout(CheckoutError::AlreadySubmitted) => StatusCode::CONFLICT,
            Self::Cart(CartError::NotFound(_)) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Identity(_) => StatusCode::BAD_GATEWAY,
            Self::Checkout(
                CheckoutError::PartialOrderFailure { .. } | CheckoutError::CartNotCleared { .. },
            )
            | Self::Session(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether this error should be reported to Sentry.
    const fn is_reportable(&self) -> bool {
        match self {
            Self::Gateway(err)
            | Self::Cart(CartError::Store(err))
            | Self::Checkout(CheckoutError::Store(err)) => {
                matches!(err, GatewayError::Database(_) | GatewayError::DataCorruption(_))
            }
            Self::Checkout(
                CheckoutError::PartialOrderFailure { .. } | CheckoutError::CartNotCleared { .. },
            )
            | Self::Session(_)
            | Self::Internal(_) => true,
            _ => false,
        }
    }

    /// Message safe to show to the client.
    fn client_message(&self) -> String {
        match self {
            Self::Gateway(err)
            | Self::Cart(CartError::Store(err))
            | Self::Checkout(CheckoutError::Store(err)) => {
                match err {
                    GatewayError::Database(_) | GatewayError::DataCorruption(_) => {
                        "Internal server error".to_string()
                    }
                    other => other.to_string(),
                }
            }
            Self::Session(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Identity(IdentityError::InvalidToken) => {
                "Invalid or expired access token".to_string()
            }
            Self::Identity(_) => "Identity provider unavailable".to_string(),
            Self::Cart(err) => err.to_string(),
            Self::Checkout(err) => err.to_string(),
            Self::Storage(err) => err.to_string(),
            _ => self.to_string(),
        }
    }
}

/// Store failures are reported to the client as bad requests, except data
/// that no longer fits the domain types.
const fn gateway_status(err: &GatewayError) -> StatusCode {
    match err {
        GatewayError::DataCorruption(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_reportable() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        let status = self.status();
        let body = Json(serde_json::json!({ "error": self.client_message() }));
        (status, body).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pampa_core::{CartItemId, OrderId};

    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::NotFound("test".to_string()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Cart(CartError::AuthenticationRequired).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Cart(CartError::NotFound(CartItemId::generate())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Checkout(CheckoutError::AlreadySubmitted).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Checkout(CheckoutError::PartialOrderFailure {
                order_id: OrderId::generate(),
                source: GatewayError::Timeout("delete_order"),
            })
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Checkout(CheckoutError::CartNotCleared {
                order_id: OrderId::generate(),
                source: CartError::Store(GatewayError::Timeout("clear_cart")),
            })
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Identity(IdentityError::InvalidToken).status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_gateway_errors_are_bad_requests() {
        assert_eq!(
            AppError::Gateway(GatewayError::Conflict("duplicate key".to_string())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Gateway(GatewayError::Timeout("list_products")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Gateway(GatewayError::DataCorruption("bad row".to_string())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_error_body_is_json() {
        let (status, body) = body_json(AppError::BadRequest("quantity is required".to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Bad request: quantity is required");
    }

    #[tokio::test]
    async fn test_database_details_are_hidden() {
        let (_, body) = body_json(AppError::Gateway(GatewayError::Database(
            sqlx::Error::RowNotFound,
        )))
        .await;
        assert_eq!(body["error"], "Internal server error");
    }
}
