//! Cart line items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pampa_core::{CartItemId, Money, ProductId, UserId};

use super::Product;

/// A persisted cart row, without the product join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: CartItemId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub size: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

/// Input for a new cart row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCartItem {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub size: String,
    pub color: String,
}

/// A cart row joined with a read-time snapshot of its product.
///
/// The product is `None` when it was deleted from the catalog after the
/// line was added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartItem {
    #[serde(flatten)]
    pub line: CartLine,
    pub product: Option<Product>,
}

impl CartItem {
    /// Unit price charged for this line, if the product is still known.
    #[must_use]
    pub fn unit_price(&self) -> Option<Money> {
        self.product.as_ref().map(Product::effective_price)
    }

    /// `quantity × unit price`, zero for an unpriced line.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price()
            .map_or(Money::ZERO, |price| price.times(self.line.quantity))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(quantity: u32) -> CartLine {
        CartLine {
            id: CartItemId::generate(),
            user_id: UserId::generate(),
            product_id: ProductId::parse("PP200").unwrap(),
            quantity,
            size: "M".to_string(),
            color: "Preto".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_unpriced_line_contributes_zero() {
        let item = CartItem {
            line: line(3),
            product: None,
        };
        assert_eq!(item.unit_price(), None);
        assert_eq!(item.line_total(), Money::ZERO);
    }

    #[test]
    fn test_cart_item_serializes_flat_with_product() {
        let item = CartItem {
            line: line(2),
            product: None,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["quantity"], 2);
        assert_eq!(json["product_id"], "PP200");
        assert!(json["product"].is_null());
    }
}
