//! Order placement.
//!
//! Turns the current cart into a `pending` order: one order header, one line
//! per cart item with the unit price captured at placement, then an empty
//! cart. Payment is recorded as credit card and never processed.
//!
//! The header and its lines are two gateway calls. If writing the lines
//! fails the header is deleted again; if that delete also fails the caller
//! gets [`CheckoutError::PartialOrderFailure`] naming the orphaned order.
//!
//! Once the lines are written the in-memory cart is emptied whatever the
//! store says, so the same cart cannot place those lines twice. A store
//! clear that fails is reported as [`CheckoutError::CartNotCleared`].

use thiserror::Error;
use tracing::instrument;

use pampa_core::{Money, OrderId, PaymentMethod, ShippingAddress};

use super::cart::{CartError, CartStore};
use crate::gateway::{CartGateway, CatalogGateway, GatewayError, OrderGateway, SessionProvider};
use crate::models::{NewOrder, NewOrderItem};

/// Errors that can occur while placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// No user is signed in.
    #[error("sign in to place an order")]
    AuthenticationRequired,

    /// Cart or address is not acceptable.
    #[error("{0}")]
    Validation(String),

    /// This placement has already been submitted.
    #[error("order has already been submitted")]
    AlreadySubmitted,

    /// A gateway call failed; nothing was left behind.
    #[error(transparent)]
    Store(#[from] GatewayError),

    /// Lines could not be written and the order header could not be removed.
    #[error("order {order_id} was created without its items")]
    PartialOrderFailure {
        order_id: OrderId,
        #[source]
        source: GatewayError,
    },

    /// The order was placed but the stored cart still holds its lines.
    #[error("order {order_id} was placed but the cart could not be emptied")]
    CartNotCleared {
        order_id: OrderId,
        #[source]
        source: CartError,
    },
}

/// Where a placement stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementState {
    NotSubmitted,
    Placing,
    Placed(OrderId),
    Failed,
}

/// One checkout attempt over a loaded cart.
///
/// A placement submits at most once, whatever the outcome. Retrying needs a
/// fresh `OrderPlacement`.
pub struct OrderPlacement<'a, G, S> {
    cart: &'a mut CartStore<G, S>,
    state: PlacementState,
}

impl<'a, G, S> OrderPlacement<'a, G, S>
where
    G: CatalogGateway + CartGateway + OrderGateway,
    S: SessionProvider,
{
    pub const fn new(cart: &'a mut CartStore<G, S>) -> Self {
        Self {
            cart,
            state: PlacementState::NotSubmitted,
        }
    }

    #[must_use]
    pub const fn state(&self) -> PlacementState {
        self.state
    }

    /// Place the order for the cart's current contents.
    ///
    /// The total is the cart total at the moment of placement and each line
    /// keeps the product's effective price.
    ///
    /// # Errors
    ///
    /// See [`CheckoutError`]. Validation failures make no gateway call.
    /// [`CheckoutError::CartNotCleared`] still leaves the placement
    /// [`PlacementState::Placed`].
    #[instrument(skip(self, address))]
    pub async fn place_order(&mut self, address: ShippingAddress) -> Result<OrderId, CheckoutError> {
        if self.state != PlacementState::NotSubmitted {
            return Err(CheckoutError::AlreadySubmitted);
        }
        self.state = PlacementState::Placing;

        let result = self.submit(address).await;
        self.state = match &result {
            Ok(order_id) | Err(CheckoutError::CartNotCleared { order_id, .. }) => {
                PlacementState::Placed(*order_id)
            }
            Err(_) => PlacementState::Failed,
        };
        result
    }

    async fn submit(&mut self, address: ShippingAddress) -> Result<OrderId, CheckoutError> {
        let user_id = self
            .cart
            .user_id()
            .ok_or(CheckoutError::AuthenticationRequired)?;

        if self.cart.is_empty() {
            return Err(CheckoutError::Validation("cart is empty".to_string()));
        }
        address
            .validate()
            .map_err(|e| CheckoutError::Validation(e.to_string()))?;
        if let Some(item) = self.cart.items().iter().find(|item| item.product.is_none()) {
            return Err(CheckoutError::Validation(format!(
                "product {} is no longer available",
                item.line.product_id
            )));
        }

        let total_amount = self.cart.total();
        let gateway = self.cart.gateway();

        let order = gateway
            .create_order(NewOrder {
                user_id,
                total_amount,
                shipping_address: address,
                payment_method: PaymentMethod::CreditCard,
            })
            .await?;

        let lines: Vec<NewOrderItem> = self
            .cart
            .items()
            .iter()
            .map(|item| NewOrderItem {
                order_id: order.id,
                product_id: item.line.product_id.clone(),
                quantity: item.line.quantity,
                price_at_time: item.unit_price().unwrap_or(Money::ZERO),
                size: item.line.size.clone(),
                color: item.line.color.clone(),
            })
            .collect();

        if let Err(err) = gateway.insert_order_items(lines).await {
            tracing::error!(order_id = %order.id, error = %err, "Order items insert failed; removing order");
            return match gateway.delete_order(order.id).await {
                Ok(true) => Err(CheckoutError::Store(err)),
                Ok(false) => {
                    tracing::warn!(
                        order_id = %order.id,
                        "Order was already gone when removing it after failed items insert"
                    );
                    Err(CheckoutError::Store(err))
                }
                Err(delete_err) => {
                    tracing::error!(
                        order_id = %order.id,
                        error = %delete_err,
                        "Could not remove order after failed items insert"
                    );
                    Err(CheckoutError::PartialOrderFailure {
                        order_id: order.id,
                        source: err,
                    })
                }
            };
        }

        tracing::info!(order_id = %order.id, %user_id, total = %total_amount, "Order placed");

        let cleared = self.cart.clear().await;
        self.cart.discard_items();
        if let Err(err) = cleared {
            tracing::warn!(order_id = %order.id, error = %err, "Order placed but cart was not cleared");
            return Err(CheckoutError::CartNotCleared {
                order_id: order.id,
                source: err,
            });
        }
        Ok(order.id)
    }
}
