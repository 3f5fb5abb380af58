//! Cart store.
//!
//! Holds the signed-in user's cart lines, keeps them in step with the data
//! store and computes the running total. Product data is joined at read time
//! from the catalog and never written back.
//!
//! There is no optimistic concurrency: two tabs editing the same cart race
//! and the last write wins at the store.

use std::collections::HashMap;

use thiserror::Error;
use tracing::instrument;

use pampa_core::{CartItemId, Money, ProductId, UserId};

use crate::gateway::{CartGateway, CatalogGateway, GatewayError, SessionProvider};
use crate::models::{CartItem, CartLine, NewCartItem, Product};

/// Largest quantity accepted on a single line.
pub const MAX_LINE_QUANTITY: u32 = 999;

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// No user is signed in.
    #[error("sign in to use the cart")]
    AuthenticationRequired,

    /// The request breaks a cart rule.
    #[error("{0}")]
    Validation(String),

    /// The cart line does not exist (or belongs to someone else).
    #[error("cart item {0} not found")]
    NotFound(CartItemId),

    /// The data store call failed.
    #[error(transparent)]
    Store(#[from] GatewayError),
}

/// Check a line before it is written.
///
/// `size` and `color` must be non-blank and, when the product declares
/// sizes or colors, one of them.
///
/// # Errors
///
/// Returns [`CartError::Validation`] describing the first broken rule.
pub fn validate_line(
    product: &Product,
    quantity: u32,
    size: &str,
    color: &str,
) -> Result<(), CartError> {
    validate_quantity(quantity)?;
    if size.trim().is_empty() {
        return Err(CartError::Validation("size is required".to_string()));
    }
    if color.trim().is_empty() {
        return Err(CartError::Validation("color is required".to_string()));
    }
    if !product.offers_size(size) {
        return Err(CartError::Validation(format!(
            "size '{size}' is not available for {}",
            product.id
        )));
    }
    if !product.offers_color(color) {
        return Err(CartError::Validation(format!(
            "color '{color}' is not available for {}",
            product.id
        )));
    }
    Ok(())
}

/// Check a quantity against the per-line bounds.
///
/// # Errors
///
/// Returns [`CartError::Validation`] outside `1..=MAX_LINE_QUANTITY`.
pub fn validate_quantity(quantity: u32) -> Result<(), CartError> {
    if quantity == 0 {
        return Err(CartError::Validation(
            "quantity must be at least 1".to_string(),
        ));
    }
    if quantity > MAX_LINE_QUANTITY {
        return Err(CartError::Validation(format!(
            "quantity must be at most {MAX_LINE_QUANTITY}"
        )));
    }
    Ok(())
}

/// The signed-in user's cart.
#[derive(Debug)]
pub struct CartStore<G, S> {
    gateway: G,
    session: S,
    items: Vec<CartItem>,
}

impl<G, S> CartStore<G, S>
where
    G: CatalogGateway + CartGateway,
    S: SessionProvider,
{
    /// Create an empty, unloaded cart.
    #[must_use]
    pub const fn new(gateway: G, session: S) -> Self {
        Self {
            gateway,
            session,
            items: Vec::new(),
        }
    }

    /// Items currently held in memory.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Session user, if any.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.session.current_user_id()
    }

    #[must_use]
    pub const fn gateway(&self) -> &G {
        &self.gateway
    }

    /// `Σ quantity × effective price`. Lines whose product is gone count as zero.
    #[must_use]
    pub fn total(&self) -> Money {
        self.items
            .iter()
            .map(|item| {
                if item.product.is_none() {
                    tracing::warn!(
                        cart_item_id = %item.line.id,
                        product_id = %item.line.product_id,
                        "Cart line has no product; counting it as zero"
                    );
                }
                item.line_total()
            })
            .sum()
    }

    /// Replace the in-memory cart with the user's stored lines.
    ///
    /// With no session the cart is simply empty.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Store`] if the lines or their products cannot be read.
    #[instrument(skip(self), fields(user_id))]
    pub async fn load(&mut self) -> Result<(), CartError> {
        let Some(user_id) = self.user_id() else {
            self.items.clear();
            return Ok(());
        };
        tracing::Span::current().record("user_id", tracing::field::display(user_id));

        let lines = self.gateway.list_cart_items(user_id).await?;
        self.items = self.join_products(lines).await?;
        Ok(())
    }

    /// Add a line for `product` and return it. Identical lines are not merged.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::AuthenticationRequired`] without a session,
    /// [`CartError::Validation`] for a bad quantity, size or color (nothing
    /// is written), or [`CartError::Store`] if the insert fails.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add_item(
        &mut self,
        product: &Product,
        quantity: u32,
        size: &str,
        color: &str,
    ) -> Result<CartItem, CartError> {
        let user_id = self.user_id().ok_or(CartError::AuthenticationRequired)?;
        validate_line(product, quantity, size, color)?;

        let line = self
            .gateway
            .insert_cart_item(NewCartItem {
                user_id,
                product_id: product.id.clone(),
                quantity,
                size: size.trim().to_string(),
                color: color.trim().to_string(),
            })
            .await?;

        let item = CartItem {
            line,
            product: Some(product.clone()),
        };
        self.items.push(item.clone());
        Ok(item)
    }

    /// Delete one line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotFound`] if the line is not in this cart or the
    /// store deleted nothing; the in-memory cart is then unchanged.
    #[instrument(skip(self))]
    pub async fn remove_item(&mut self, id: CartItemId) -> Result<(), CartError> {
        self.user_id().ok_or(CartError::AuthenticationRequired)?;
        let index = self.position(id)?;

        if !self.gateway.delete_cart_item(id).await? {
            return Err(CartError::NotFound(id));
        }
        self.items.remove(index);
        Ok(())
    }

    /// Set the quantity of one line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Validation`] for a quantity outside the allowed
    /// range and [`CartError::NotFound`] for an unknown line.
    #[instrument(skip(self))]
    pub async fn update_quantity(&mut self, id: CartItemId, quantity: u32) -> Result<(), CartError> {
        self.user_id().ok_or(CartError::AuthenticationRequired)?;
        validate_quantity(quantity)?;
        let index = self.position(id)?;

        if !self.gateway.update_cart_item_quantity(id, quantity).await? {
            return Err(CartError::NotFound(id));
        }
        if let Some(item) = self.items.get_mut(index) {
            item.line.quantity = quantity;
        }
        Ok(())
    }

    /// Delete every line of the user's cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Store`] if the delete fails; memory is then unchanged.
    #[instrument(skip(self))]
    pub async fn clear(&mut self) -> Result<(), CartError> {
        let user_id = self.user_id().ok_or(CartError::AuthenticationRequired)?;
        let removed = self.gateway.clear_cart(user_id).await?;
        tracing::debug!(%user_id, removed, "Cart cleared");
        self.items.clear();
        Ok(())
    }

    /// Drop the in-memory lines without touching the store.
    pub(crate) fn discard_items(&mut self) {
        self.items.clear();
    }

    fn position(&self, id: CartItemId) -> Result<usize, CartError> {
        self.items
            .iter()
            .position(|item| item.line.id == id)
            .ok_or(CartError::NotFound(id))
    }

    async fn join_products(&self, lines: Vec<CartLine>) -> Result<Vec<CartItem>, CartError> {
        let mut ids: Vec<ProductId> = lines.iter().map(|l| l.product_id.clone()).collect();
        ids.sort();
        ids.dedup();

        let products: HashMap<ProductId, Product> = self
            .gateway
            .products_by_ids(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();

        Ok(lines
            .into_iter()
            .map(|line| {
                let product = products.get(&line.product_id).cloned();
                CartItem { line, product }
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn boot() -> Product {
        Product {
            id: ProductId::parse("bota-couro").unwrap(),
            name: "Bota de Couro".to_string(),
            description: String::new(),
            price: Money::from_minor(34_990).unwrap(),
            promotional_price: None,
            category: Some("Calçados".to_string()),
            is_featured: true,
            is_new_collection: false,
            images: vec![],
            primary_image: None,
            sizes: vec!["39".to_string(), "40".to_string()],
            colors: vec!["Marrom".to_string(), "Preto".to_string()],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_validate_line_accepts_declared_options() {
        assert!(validate_line(&boot(), 1, "40", "Marrom").is_ok());
    }

    #[test]
    fn test_validate_line_rejects_zero_quantity() {
        assert!(matches!(
            validate_line(&boot(), 0, "40", "Marrom"),
            Err(CartError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_line_rejects_blank_size_and_color() {
        assert!(matches!(
            validate_line(&boot(), 1, " ", "Marrom"),
            Err(CartError::Validation(_))
        ));
        assert!(matches!(
            validate_line(&boot(), 1, "40", ""),
            Err(CartError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_line_rejects_undeclared_options() {
        let err = validate_line(&boot(), 1, "44", "Marrom").unwrap_err();
        assert!(err.to_string().contains("44"));
        assert!(validate_line(&boot(), 1, "40", "Bege").is_err());
    }

    #[test]
    fn test_validate_quantity_upper_bound() {
        assert!(validate_quantity(MAX_LINE_QUANTITY).is_ok());
        assert!(validate_quantity(MAX_LINE_QUANTITY + 1).is_err());
    }
}
