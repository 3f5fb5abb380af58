//! `PostgreSQL` implementation of the data gateway.
//!
//! ## Tables
//!
//! - `produtos` - Catalog products (text ids assigned by the admin)
//! - `cart_items` - In-progress cart lines per user
//! - `orders` - Order headers with the shipping address as JSONB
//! - `order_items` - Order lines with the unit price snapshot
//! - `tower_sessions.session` - Session storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p pampa-cli -- migrate
//! ```

mod cart_items;
mod orders;
mod products;

use std::future::Future;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::gateway::{Gateway, GatewayError};

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Gateway backed by a `PostgreSQL` pool.
///
/// Every statement is bounded by `timeout`; an elapsed timeout surfaces as
/// [`GatewayError::Timeout`] and the statement future is dropped.
#[derive(Debug, Clone)]
pub struct PgGateway {
    pool: PgPool,
    timeout: Duration,
}

impl PgGateway {
    #[must_use]
    pub const fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run `query` under the gateway timeout.
    async fn bounded<T, F>(&self, operation: &'static str, query: F) -> Result<T, GatewayError>
    where
        F: Future<Output = Result<T, sqlx::Error>> + Send,
    {
        match tokio::time::timeout(self.timeout, query).await {
            Ok(result) => result.map_err(map_sqlx_error),
            Err(_) => {
                tracing::warn!(operation, timeout = ?self.timeout, "Gateway call timed out");
                Err(GatewayError::Timeout(operation))
            }
        }
    }
}

impl Gateway for PgGateway {
    async fn ping(&self) -> Result<(), GatewayError> {
        self.bounded("ping", sqlx::query("SELECT 1").execute(&self.pool))
            .await
            .map(|_| ())
    }
}

/// Map driver errors onto gateway errors, pulling out constraint violations.
fn map_sqlx_error(err: sqlx::Error) -> GatewayError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            return GatewayError::Conflict(format!(
                "duplicate key ({})",
                db_err.constraint().unwrap_or("unique")
            ));
        }
        if db_err.is_foreign_key_violation() {
            return GatewayError::Conflict(format!(
                "referenced row does not exist ({})",
                db_err.constraint().unwrap_or("foreign key")
            ));
        }
        if db_err.is_check_violation() {
            return GatewayError::Conflict(format!(
                "check constraint failed ({})",
                db_err.constraint().unwrap_or("check")
            ));
        }
    }
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            GatewayError::Unavailable(err.to_string())
        }
        other => GatewayError::Database(other),
    }
}

/// Convert a stored quantity into the domain type.
fn quantity_from_db(quantity: i32) -> Result<u32, GatewayError> {
    u32::try_from(quantity)
        .ok()
        .filter(|q| *q >= 1)
        .ok_or_else(|| GatewayError::DataCorruption(format!("invalid quantity in database: {quantity}")))
}

/// Convert a domain quantity into the column type.
fn quantity_to_db(quantity: u32) -> Result<i32, GatewayError> {
    i32::try_from(quantity)
        .map_err(|_| GatewayError::Conflict(format!("quantity {quantity} is out of range")))
}

/// Convert a stored amount into [`pampa_core::Money`].
fn money_from_db(
    amount: rust_decimal::Decimal,
    column: &str,
) -> Result<pampa_core::Money, GatewayError> {
    pampa_core::Money::from_decimal(amount)
        .map_err(|e| GatewayError::DataCorruption(format!("invalid {column} in database: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_quantity_from_db_rejects_non_positive() {
        assert!(quantity_from_db(0).is_err());
        assert!(quantity_from_db(-2).is_err());
        assert!(matches!(quantity_from_db(3), Ok(3)));
    }

    #[test]
    fn test_quantity_to_db_range() {
        assert!(quantity_to_db(u32::MAX).is_err());
        assert!(matches!(quantity_to_db(12), Ok(12)));
    }

    #[test]
    fn test_money_from_db_rejects_negative() {
        let err = money_from_db(Decimal::new(-100, 2), "preco").unwrap_err();
        assert!(matches!(err, GatewayError::DataCorruption(_)));
    }

    #[test]
    fn test_pool_errors_map_to_unavailable() {
        assert!(matches!(
            map_sqlx_error(sqlx::Error::PoolTimedOut),
            GatewayError::Unavailable(_)
        ));
        assert!(matches!(
            map_sqlx_error(sqlx::Error::RowNotFound),
            GatewayError::Database(_)
        ));
    }
}
