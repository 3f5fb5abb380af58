//! Integration tests for order placement.
//!
//! Each test loads a cart through the cart store and places it against the
//! in-memory gateway, then inspects the orders, order lines and cart rows
//! left behind.

#![allow(clippy::unwrap_used)]

use pampa_core::{OrderStatus, PaymentMethod, ProductId, UserId};
use pampa_integration_tests::{FailPoint, MemoryGateway, brl, product, shipping_address};
use pampa_storefront::services::cart::CartStore;
use pampa_storefront::services::checkout::{CheckoutError, OrderPlacement, PlacementState};

/// A signed-in cart holding 2 × A at 100,00 and 1 × B at 30,00 (list 50,00).
async fn two_product_cart(gateway: &MemoryGateway) -> (UserId, CartStore<MemoryGateway, UserId>) {
    let a = gateway.put_product(product("camisa-campeira", 10_000, None, 0));
    let b = gateway.put_product(product("lenco-tradicional", 5_000, Some(3_000), 0));
    let user = UserId::generate();
    let mut cart = CartStore::new(gateway.clone(), user);
    cart.add_item(&a, 2, "M", "Preto").await.unwrap();
    cart.add_item(&b, 1, "P", "Bege").await.unwrap();
    (user, cart)
}

// =============================================================================
// Successful placement
// =============================================================================

#[tokio::test]
async fn test_places_pending_order_with_price_snapshot() {
    let gateway = MemoryGateway::new();
    let (user, mut cart) = two_product_cart(&gateway).await;
    assert_eq!(cart.total(), brl(23_000));

    let mut placement = OrderPlacement::new(&mut cart);
    let order_id = placement.place_order(shipping_address()).await.unwrap();
    assert_eq!(placement.state(), PlacementState::Placed(order_id));

    let orders = gateway.orders();
    assert_eq!(orders.len(), 1);
    let order = &orders[0];
    assert_eq!(order.id, order_id);
    assert_eq!(order.user_id, user);
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.payment_method, PaymentMethod::CreditCard);
    assert_eq!(order.total_amount, brl(23_000));
    assert_eq!(order.shipping_address, shipping_address());

    let mut lines: Vec<_> = gateway
        .order_items()
        .into_iter()
        .map(|item| (item.product_id.to_string(), item.quantity, item.price_at_time))
        .collect();
    lines.sort();
    assert_eq!(
        lines,
        vec![
            ("camisa-campeira".to_string(), 2, brl(10_000)),
            ("lenco-tradicional".to_string(), 1, brl(3_000)),
        ]
    );

    assert!(cart.is_empty());
    assert!(gateway.cart_lines(user).is_empty());
}

#[tokio::test]
async fn test_later_price_change_does_not_touch_placed_order() {
    let gateway = MemoryGateway::new();
    let (_, mut cart) = two_product_cart(&gateway).await;

    OrderPlacement::new(&mut cart)
        .place_order(shipping_address())
        .await
        .unwrap();
    gateway.put_product(product("camisa-campeira", 99_900, None, 0));

    assert_eq!(gateway.orders()[0].total_amount, brl(23_000));
    assert!(
        gateway
            .order_items()
            .iter()
            .all(|item| item.price_at_time != brl(99_900))
    );
}

#[tokio::test]
async fn test_cart_clear_failure_still_places_order() {
    let gateway = MemoryGateway::new();
    let (user, mut cart) = two_product_cart(&gateway).await;
    gateway.fail(FailPoint::ClearCart);

    let mut placement = OrderPlacement::new(&mut cart);
    let err = placement.place_order(shipping_address()).await.unwrap_err();
    let CheckoutError::CartNotCleared { order_id, .. } = err else {
        panic!("expected CartNotCleared, got {err:?}");
    };
    assert_eq!(placement.state(), PlacementState::Placed(order_id));

    assert_eq!(gateway.orders()[0].id, order_id);
    assert_eq!(gateway.order_items().len(), 2);
    // Lines stay in the store for the user to clear
    assert_eq!(gateway.cart_lines(user).len(), 2);
    assert!(cart.is_empty());
    assert_eq!(cart.total(), brl(0));
}

#[tokio::test]
async fn test_cart_clear_failure_does_not_allow_a_second_order() {
    let gateway = MemoryGateway::new();
    let (_, mut cart) = two_product_cart(&gateway).await;
    gateway.fail(FailPoint::ClearCart);

    let mut placement = OrderPlacement::new(&mut cart);
    assert!(placement.place_order(shipping_address()).await.is_err());
    assert!(matches!(
        placement.place_order(shipping_address()).await,
        Err(CheckoutError::AlreadySubmitted)
    ));

    gateway.recover(FailPoint::ClearCart);
    assert!(matches!(
        OrderPlacement::new(&mut cart)
            .place_order(shipping_address())
            .await,
        Err(CheckoutError::Validation(_))
    ));
    assert_eq!(gateway.orders().len(), 1);
    assert_eq!(gateway.order_items().len(), 2);
}

// =============================================================================
// Rejections before any write
// =============================================================================

#[tokio::test]
async fn test_no_session_writes_nothing() {
    let gateway = MemoryGateway::new();
    gateway.put_product(product("camisa-campeira", 10_000, None, 0));
    let mut cart = CartStore::new(gateway.clone(), None::<UserId>);
    cart.load().await.unwrap();

    let mut placement = OrderPlacement::new(&mut cart);
    assert!(matches!(
        placement.place_order(shipping_address()).await,
        Err(CheckoutError::AuthenticationRequired)
    ));
    assert_eq!(placement.state(), PlacementState::Failed);
    assert_eq!(gateway.writes(), 0);
}

#[tokio::test]
async fn test_empty_cart_is_rejected() {
    let gateway = MemoryGateway::new();
    let mut cart = CartStore::new(gateway.clone(), UserId::generate());
    cart.load().await.unwrap();

    assert!(matches!(
        OrderPlacement::new(&mut cart)
            .place_order(shipping_address())
            .await,
        Err(CheckoutError::Validation(_))
    ));
    assert!(gateway.orders().is_empty());
}

#[tokio::test]
async fn test_incomplete_address_is_rejected() {
    let gateway = MemoryGateway::new();
    let (user, mut cart) = two_product_cart(&gateway).await;
    let writes_before = gateway.writes();

    let mut address = shipping_address();
    address.city = "  ".to_string();
    let err = OrderPlacement::new(&mut cart)
        .place_order(address)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("cidade"));

    let mut address = shipping_address();
    address.postal_code = "9640".to_string();
    assert!(matches!(
        OrderPlacement::new(&mut cart).place_order(address).await,
        Err(CheckoutError::Validation(_))
    ));

    assert_eq!(gateway.writes(), writes_before);
    assert_eq!(gateway.cart_lines(user).len(), 2);
}

#[tokio::test]
async fn test_item_without_product_is_rejected() {
    let gateway = MemoryGateway::new();
    let (user, _) = two_product_cart(&gateway).await;
    gateway.orphan_product(&ProductId::parse("lenco-tradicional").unwrap());

    let mut cart = CartStore::new(gateway.clone(), user);
    cart.load().await.unwrap();
    let err = OrderPlacement::new(&mut cart)
        .place_order(shipping_address())
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::Validation(_)));
    assert!(err.to_string().contains("lenco-tradicional"));
    assert!(gateway.orders().is_empty());
}

#[tokio::test]
async fn test_second_submit_is_refused() {
    let gateway = MemoryGateway::new();
    let (_, mut cart) = two_product_cart(&gateway).await;

    let mut placement = OrderPlacement::new(&mut cart);
    placement.place_order(shipping_address()).await.unwrap();
    assert!(matches!(
        placement.place_order(shipping_address()).await,
        Err(CheckoutError::AlreadySubmitted)
    ));
    assert_eq!(gateway.orders().len(), 1);
}

#[tokio::test]
async fn test_failed_placement_is_not_retried() {
    let gateway = MemoryGateway::new();
    let (_, mut cart) = two_product_cart(&gateway).await;
    gateway.fail(FailPoint::CreateOrder);

    let mut placement = OrderPlacement::new(&mut cart);
    assert!(matches!(
        placement.place_order(shipping_address()).await,
        Err(CheckoutError::Store(_))
    ));
    assert_eq!(placement.state(), PlacementState::Failed);

    gateway.recover(FailPoint::CreateOrder);
    assert!(matches!(
        placement.place_order(shipping_address()).await,
        Err(CheckoutError::AlreadySubmitted)
    ));
    assert!(gateway.orders().is_empty());

    // A fresh placement over the same cart goes through
    OrderPlacement::new(&mut cart)
        .place_order(shipping_address())
        .await
        .unwrap();
    assert_eq!(gateway.orders().len(), 1);
}

// =============================================================================
// Failures after the header is written
// =============================================================================

#[tokio::test]
async fn test_line_failure_removes_order_and_keeps_cart() {
    let gateway = MemoryGateway::new();
    let (user, mut cart) = two_product_cart(&gateway).await;
    gateway.fail(FailPoint::InsertOrderItems);

    let err = OrderPlacement::new(&mut cart)
        .place_order(shipping_address())
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::Store(_)));
    assert!(gateway.orders().is_empty());
    assert!(gateway.order_items().is_empty());
    assert_eq!(cart.items().len(), 2);
    assert_eq!(cart.total(), brl(23_000));
    assert_eq!(gateway.cart_lines(user).len(), 2);
}

#[tokio::test]
async fn test_line_failure_with_order_already_gone() {
    let gateway = MemoryGateway::new();
    let (user, mut cart) = two_product_cart(&gateway).await;
    gateway.lose_orders();

    let mut placement = OrderPlacement::new(&mut cart);
    let err = placement.place_order(shipping_address()).await.unwrap_err();

    assert!(matches!(err, CheckoutError::Store(_)));
    assert_eq!(placement.state(), PlacementState::Failed);
    assert!(gateway.orders().is_empty());
    assert!(gateway.order_items().is_empty());
    assert_eq!(cart.items().len(), 2);
    assert_eq!(gateway.cart_lines(user).len(), 2);
}

#[tokio::test]
async fn test_failed_cleanup_reports_orphaned_order() {
    let gateway = MemoryGateway::new();
    let (user, mut cart) = two_product_cart(&gateway).await;
    gateway.fail(FailPoint::InsertOrderItems);
    gateway.fail(FailPoint::DeleteOrder);

    let err = OrderPlacement::new(&mut cart)
        .place_order(shipping_address())
        .await
        .unwrap_err();

    let CheckoutError::PartialOrderFailure { order_id, .. } = err else {
        panic!("expected PartialOrderFailure, got {err:?}");
    };
    let orders = gateway.orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id, order_id);
    assert!(gateway.order_items().is_empty());
    assert_eq!(gateway.cart_lines(user).len(), 2);
}
