//! Order and order line repository queries.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

use pampa_core::{
    OrderId, OrderItemId, OrderStatus, PaymentMethod, ProductId, ShippingAddress, UserId,
};

use super::{PgGateway, money_from_db, quantity_from_db, quantity_to_db};
use crate::gateway::{GatewayError, OrderGateway};
use crate::models::{NewOrder, NewOrderItem, Order, OrderFilter, OrderItem, OrderPatch};

const ORDER_COLUMNS: &str =
    "id, user_id, status, total_amount, shipping_address, payment_method, created_at";
const ORDER_ITEM_COLUMNS: &str = "id, order_id, product_id, quantity, price_at_time, size, color";

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` order queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    status: OrderStatus,
    total_amount: Decimal,
    shipping_address: Json<ShippingAddress>,
    payment_method: PaymentMethod,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = GatewayError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            status: row.status,
            total_amount: money_from_db(row.total_amount, "total_amount")?,
            shipping_address: row.shipping_address.0,
            payment_method: row.payment_method,
            created_at: row.created_at,
        })
    }
}

/// Internal row type for `PostgreSQL` order line queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: OrderItemId,
    order_id: OrderId,
    product_id: ProductId,
    quantity: i32,
    price_at_time: Decimal,
    size: String,
    color: String,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = GatewayError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            quantity: quantity_from_db(row.quantity)?,
            price_at_time: money_from_db(row.price_at_time, "price_at_time")?,
            size: row.size,
            color: row.color,
        })
    }
}

/// Column-wise arrays for a single `UNNEST` insert.
#[derive(Default)]
struct OrderItemColumns {
    ids: Vec<Uuid>,
    order_ids: Vec<Uuid>,
    product_ids: Vec<String>,
    quantities: Vec<i32>,
    prices: Vec<Decimal>,
    sizes: Vec<String>,
    colors: Vec<String>,
}

impl OrderItemColumns {
    fn from_items(items: Vec<NewOrderItem>) -> Result<Self, GatewayError> {
        let mut columns = Self::default();
        for item in items {
            columns.ids.push(OrderItemId::generate().as_uuid());
            columns.order_ids.push(item.order_id.as_uuid());
            columns.product_ids.push(item.product_id.into_inner());
            columns.quantities.push(quantity_to_db(item.quantity)?);
            columns.prices.push(item.price_at_time.to_decimal());
            columns.sizes.push(item.size);
            columns.colors.push(item.color);
        }
        Ok(columns)
    }
}

impl OrderGateway for PgGateway {
    #[instrument(skip(self))]
    async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<Order>, GatewayError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE ($1::order_status IS NULL OR status = $1) \
               AND ($2::uuid IS NULL OR user_id = $2) \
             ORDER BY created_at DESC, id"
        );
        let rows = self
            .bounded(
                "list_orders",
                sqlx::query_as::<_, OrderRow>(&sql)
                    .bind(filter.status)
                    .bind(filter.user_id)
                    .fetch_all(&self.pool),
            )
            .await?;
        rows.into_iter().map(Order::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, GatewayError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        let row = self
            .bounded(
                "get_order",
                sqlx::query_as::<_, OrderRow>(&sql)
                    .bind(id)
                    .fetch_optional(&self.pool),
            )
            .await?;
        row.map(Order::try_from).transpose()
    }

    #[instrument(skip(self, order), fields(user_id = %order.user_id, total = %order.total_amount))]
    async fn create_order(&self, order: NewOrder) -> Result<Order, GatewayError> {
        let sql = format!(
            "INSERT INTO orders (id, user_id, status, total_amount, shipping_address, payment_method) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {ORDER_COLUMNS}"
        );
        let row = self
            .bounded(
                "create_order",
                sqlx::query_as::<_, OrderRow>(&sql)
                    .bind(OrderId::generate())
                    .bind(order.user_id)
                    .bind(OrderStatus::Pending)
                    .bind(order.total_amount.to_decimal())
                    .bind(Json(order.shipping_address))
                    .bind(order.payment_method)
                    .fetch_one(&self.pool),
            )
            .await?;
        Order::try_from(row)
    }

    #[instrument(skip(self, items), fields(count = items.len()))]
    async fn insert_order_items(
        &self,
        items: Vec<NewOrderItem>,
    ) -> Result<Vec<OrderItem>, GatewayError> {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        let columns = OrderItemColumns::from_items(items)?;
        let sql = format!(
            "INSERT INTO order_items ({ORDER_ITEM_COLUMNS}) \
             SELECT * FROM UNNEST($1::uuid[], $2::uuid[], $3::text[], $4::int4[], \
                                  $5::numeric[], $6::text[], $7::text[]) \
             RETURNING {ORDER_ITEM_COLUMNS}"
        );
        let rows = self
            .bounded(
                "insert_order_items",
                sqlx::query_as::<_, OrderItemRow>(&sql)
                    .bind(columns.ids)
                    .bind(columns.order_ids)
                    .bind(columns.product_ids)
                    .bind(columns.quantities)
                    .bind(columns.prices)
                    .bind(columns.sizes)
                    .bind(columns.colors)
                    .fetch_all(&self.pool),
            )
            .await?;
        rows.into_iter().map(OrderItem::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn list_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, GatewayError> {
        let sql =
            format!("SELECT {ORDER_ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id");
        let rows = self
            .bounded(
                "list_order_items",
                sqlx::query_as::<_, OrderItemRow>(&sql)
                    .bind(order_id)
                    .fetch_all(&self.pool),
            )
            .await?;
        rows.into_iter().map(OrderItem::try_from).collect()
    }

    #[instrument(skip(self, patch))]
    async fn update_order(
        &self,
        id: OrderId,
        patch: OrderPatch,
    ) -> Result<Option<Order>, GatewayError> {
        if patch.is_empty() {
            return self.get_order(id).await;
        }

        let mut builder = build_order_update(id, patch);
        let row = self
            .bounded(
                "update_order",
                builder.build_query_as::<OrderRow>().fetch_optional(&self.pool),
            )
            .await?;
        row.map(Order::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn delete_order(&self, id: OrderId) -> Result<bool, GatewayError> {
        let result = self
            .bounded(
                "delete_order",
                sqlx::query("DELETE FROM orders WHERE id = $1")
                    .bind(id)
                    .execute(&self.pool),
            )
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Build `UPDATE orders SET ... WHERE id = $n RETURNING ...` for the fields
/// present in `patch`. The patch must not be empty.
fn build_order_update(id: OrderId, patch: OrderPatch) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::<Postgres>::new("UPDATE orders SET ");
    let mut set = builder.separated(", ");

    if let Some(status) = patch.status {
        set.push("status = ").push_bind_unseparated(status);
    }
    if let Some(address) = patch.shipping_address {
        set.push("shipping_address = ")
            .push_bind_unseparated(Json(address));
    }

    builder
        .push(" WHERE id = ")
        .push_bind(id)
        .push(" RETURNING ")
        .push(ORDER_COLUMNS);
    builder
}
