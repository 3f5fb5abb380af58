//! Order and order line types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pampa_core::{
    Money, OrderId, OrderItemId, OrderStatus, PaymentMethod, ProductId, ShippingAddress, UserId,
};

/// An order header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    /// Cart total at checkout. Never recomputed.
    pub total_amount: Money,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
}

/// Input for a new order header. Orders always start as pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: UserId,
    pub total_amount: Money,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
}

/// A line of a placed order. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    /// Unit price snapshot taken at checkout.
    pub price_at_time: Money,
    pub size: String,
    pub color: String,
}

/// Input for a new order line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub price_at_time: Money,
    pub size: String,
    pub color: String,
}

/// Admin update of an order. Totals and lines cannot be edited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderPatch {
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub shipping_address: Option<ShippingAddress>,
}

impl OrderPatch {
    /// Whether the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.status.is_none() && self.shipping_address.is_none()
    }
}

/// Optional equality filters for order listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub user_id: Option<UserId>,
}

impl OrderFilter {
    /// Orders belonging to `user_id`.
    #[must_use]
    pub const fn for_user(user_id: UserId) -> Self {
        Self {
            status: None,
            user_id: Some(user_id),
        }
    }

    /// Whether `order` passes the filters.
    #[must_use]
    pub fn matches(&self, order: &Order) -> bool {
        self.status.is_none_or(|s| order.status == s)
            && self.user_id.is_none_or(|u| order.user_id == u)
    }
}
