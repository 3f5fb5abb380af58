//! Cart line repository queries.

use chrono::{DateTime, Utc};
use tracing::instrument;

use pampa_core::{CartItemId, ProductId, UserId};

use super::{PgGateway, quantity_from_db, quantity_to_db};
use crate::gateway::{CartGateway, GatewayError};
use crate::models::{CartLine, NewCartItem};

/// Internal row type for `PostgreSQL` cart queries.
#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    id: CartItemId,
    user_id: UserId,
    product_id: ProductId,
    quantity: i32,
    size: String,
    color: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<CartLineRow> for CartLine {
    type Error = GatewayError;

    fn try_from(row: CartLineRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            product_id: row.product_id,
            quantity: quantity_from_db(row.quantity)?,
            size: row.size,
            color: row.color,
            created_at: row.created_at,
        })
    }
}

impl CartGateway for PgGateway {
    #[instrument(skip(self))]
    async fn list_cart_items(&self, user_id: UserId) -> Result<Vec<CartLine>, GatewayError> {
        let rows = self
            .bounded(
                "list_cart_items",
                sqlx::query_as::<_, CartLineRow>(
                    r"
                    SELECT id, user_id, product_id, quantity, size, color, created_at
                    FROM cart_items
                    WHERE user_id = $1
                    ORDER BY created_at, id
                    ",
                )
                .bind(user_id)
                .fetch_all(&self.pool),
            )
            .await?;
        rows.into_iter().map(CartLine::try_from).collect()
    }

    #[instrument(skip(self, item), fields(user_id = %item.user_id, product_id = %item.product_id))]
    async fn insert_cart_item(&self, item: NewCartItem) -> Result<CartLine, GatewayError> {
        let quantity = quantity_to_db(item.quantity)?;
        let row = self
            .bounded(
                "insert_cart_item",
                sqlx::query_as::<_, CartLineRow>(
                    r"
                    INSERT INTO cart_items (id, user_id, product_id, quantity, size, color)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    RETURNING id, user_id, product_id, quantity, size, color, created_at
                    ",
                )
                .bind(CartItemId::generate())
                .bind(item.user_id)
                .bind(item.product_id)
                .bind(quantity)
                .bind(item.size)
                .bind(item.color)
                .fetch_one(&self.pool),
            )
            .await?;
        CartLine::try_from(row)
    }

    #[instrument(skip(self))]
    async fn update_cart_item_quantity(
        &self,
        id: CartItemId,
        quantity: u32,
    ) -> Result<bool, GatewayError> {
        let quantity = quantity_to_db(quantity)?;
        let result = self
            .bounded(
                "update_cart_item_quantity",
                sqlx::query("UPDATE cart_items SET quantity = $2 WHERE id = $1")
                    .bind(id)
                    .bind(quantity)
                    .execute(&self.pool),
            )
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn delete_cart_item(&self, id: CartItemId) -> Result<bool, GatewayError> {
        let result = self
            .bounded(
                "delete_cart_item",
                sqlx::query("DELETE FROM cart_items WHERE id = $1")
                    .bind(id)
                    .execute(&self.pool),
            )
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn clear_cart(&self, user_id: UserId) -> Result<u64, GatewayError> {
        let result = self
            .bounded(
                "clear_cart",
                sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
                    .bind(user_id)
                    .execute(&self.pool),
            )
            .await?;
        Ok(result.rows_affected())
    }
}
