//! Integration tests for the table-level REST API.
//!
//! Requests go through the full router (session, request id, tracing and
//! CORS layers) over the in-memory gateway.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use serde_json::json;

use pampa_core::{PaymentMethod, UserId};
use pampa_integration_tests::{
    MemoryGateway, TestResponse, app, brl, product, send, shipping_address,
};
use pampa_storefront::gateway::OrderGateway;
use pampa_storefront::models::NewOrder;

/// Nothing listens here; only the identity and storage routes would call it.
const UNUSED_BACKEND: &str = "http://127.0.0.1:9";

async fn get(app: &axum::Router, uri: &str) -> TestResponse {
    send(app, Method::GET, uri, None, None).await
}

fn ids(response: &TestResponse) -> Vec<String> {
    response
        .json
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap().to_string())
        .collect()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_and_readiness() {
    let app = app(MemoryGateway::new(), UNUSED_BACKEND);
    assert_eq!(get(&app, "/health").await.status, StatusCode::OK);
    assert_eq!(get(&app, "/health/ready").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_every_response_has_request_id() {
    let app = app(MemoryGateway::new(), UNUSED_BACKEND);
    let ok = get(&app, "/api/produtos").await;
    let rejected = get(&app, "/api/produtos/%20").await;

    for response in [ok, rejected] {
        let id = response.headers.get("x-request-id").unwrap();
        assert!(!id.is_empty());
    }
}

// =============================================================================
// Products
// =============================================================================

#[tokio::test]
async fn test_product_lifecycle() {
    let gateway = MemoryGateway::new();
    let app = app(gateway.clone(), UNUSED_BACKEND);

    let created = send(
        &app,
        Method::POST,
        "/api/produtos",
        Some(json!({
            "id": "PP900",
            "nome": "Boina Basca",
            "descricao": "Boina de lã batida",
            "preco": 89.9,
            "categoria": "Boinas",
            "tamanhos": ["Único"],
            "cores": ["Preto", "Azul Marinho"]
        })),
        None,
    )
    .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.json["id"], "PP900");
    assert_eq!(created.json["preco"].as_f64(), Some(89.9));

    let fetched = get(&app, "/api/produtos/PP900").await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.json["nome"], "Boina Basca");
    assert!(fetched.json["preco_promocional"].is_null());

    let updated = send(
        &app,
        Method::PUT,
        "/api/produtos/PP900",
        Some(json!({ "preco_promocional": 69.9, "lancamento": true })),
        None,
    )
    .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.json["preco_promocional"].as_f64(), Some(69.9));
    assert_eq!(updated.json["lancamento"], true);
    assert_eq!(updated.json["nome"], "Boina Basca");

    let cleared = send(
        &app,
        Method::PUT,
        "/api/produtos/PP900",
        Some(json!({ "preco_promocional": null })),
        None,
    )
    .await;
    assert!(cleared.json["preco_promocional"].is_null());

    let deleted = send(&app, Method::DELETE, "/api/produtos/PP900", None, None).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    assert!(get(&app, "/api/produtos").await.json.as_array().unwrap().is_empty());

    // Deleting again is not an error
    let again = send(&app, Method::DELETE, "/api/produtos/PP900", None, None).await;
    assert_eq!(again.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_blank_product_id_is_generated() {
    let app = app(MemoryGateway::new(), UNUSED_BACKEND);
    let created = send(
        &app,
        Method::POST,
        "/api/produtos",
        Some(json!({ "id": "", "nome": "Casaco de Lã", "preco": 420.0, "categoria": "Casacos" })),
        None,
    )
    .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert!(created.json["id"].as_str().unwrap().starts_with("PP"));
}

#[tokio::test]
async fn test_product_rejections_are_json_400() {
    let gateway = MemoryGateway::new();
    gateway.put_product(product("bota-couro", 34_990, None, 0));
    let app = app(gateway, UNUSED_BACKEND);

    let missing = get(&app, "/api/produtos/nao-existe").await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert!(missing.error().contains("nao-existe"));

    let off_palette = send(
        &app,
        Method::POST,
        "/api/produtos",
        Some(json!({ "nome": "Lenço", "preco": 49.9, "cores": ["Roxo"] })),
        None,
    )
    .await;
    assert_eq!(off_palette.status, StatusCode::BAD_REQUEST);
    assert!(off_palette.error().contains("Roxo"));

    let duplicate = send(
        &app,
        Method::POST,
        "/api/produtos",
        Some(json!({ "id": "bota-couro", "nome": "Bota", "preco": 10.0 })),
        None,
    )
    .await;
    assert_eq!(duplicate.status, StatusCode::BAD_REQUEST);

    let malformed = send(
        &app,
        Method::POST,
        "/api/produtos",
        Some(json!({ "nome": "Sem preço" })),
        None,
    )
    .await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
    assert!(!malformed.error().is_empty());

    let unknown_field = send(
        &app,
        Method::PUT,
        "/api/produtos/bota-couro",
        Some(json!({ "estoque": 3 })),
        None,
    )
    .await;
    assert_eq!(unknown_field.status, StatusCode::BAD_REQUEST);

    let update_missing = send(
        &app,
        Method::PUT,
        "/api/produtos/nao-existe",
        Some(json!({ "preco": 10.0 })),
        None,
    )
    .await;
    assert_eq!(update_missing.status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Curated listings
// =============================================================================

#[tokio::test]
async fn test_featured_returns_four_newest() {
    let gateway = MemoryGateway::new();
    for (n, age) in [(1, 60), (2, 50), (3, 40), (4, 30), (5, 20), (6, 10)] {
        let mut p = product(&format!("PP10{n}"), 10_000, None, age);
        p.is_featured = true;
        gateway.put_product(p);
    }
    gateway.put_product(product("PP199", 10_000, None, 0));
    let app = app(gateway, UNUSED_BACKEND);

    let featured = get(&app, "/api/featured").await;
    assert_eq!(featured.status, StatusCode::OK);
    assert_eq!(ids(&featured), vec!["PP106", "PP105", "PP104", "PP103"]);
}

#[tokio::test]
async fn test_new_collection_and_shop_split_the_catalog() {
    let gateway = MemoryGateway::new();
    for (id, new) in [("PP300", true), ("PP301", false), ("PP302", true), ("PP303", false)] {
        let mut p = product(id, 10_000, None, 0);
        p.is_new_collection = new;
        gateway.put_product(p);
    }
    let app = app(gateway, UNUSED_BACKEND);

    let mut collection = ids(&get(&app, "/api/nova-colecao").await);
    collection.sort();
    assert_eq!(collection, vec!["PP300", "PP302"]);

    // Shop listing is ordered by id, highest first
    assert_eq!(ids(&get(&app, "/api/loja").await), vec!["PP303", "PP301"]);
}

// =============================================================================
// Cart by user id
// =============================================================================

#[tokio::test]
async fn test_cart_proxy_round_trip() {
    let gateway = MemoryGateway::new();
    gateway.put_product(product("camisa-campeira", 19_990, None, 0));
    let app = app(gateway.clone(), UNUSED_BACKEND);
    let user = UserId::generate();

    let added = send(
        &app,
        Method::POST,
        "/api/cart",
        Some(json!({
            "user_id": user,
            "product_id": "camisa-campeira",
            "quantity": 2,
            "size": "M",
            "color": "Preto"
        })),
        None,
    )
    .await;
    assert_eq!(added.status, StatusCode::CREATED);
    let item_id = added.json["id"].as_str().unwrap().to_string();

    let listed = get(&app, &format!("/api/cart/{user}")).await;
    assert_eq!(listed.status, StatusCode::OK);
    let lines = listed.json.as_array().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["quantity"], 2);
    assert_eq!(lines[0]["product"]["nome"], "Produto camisa-campeira");

    let updated = send(
        &app,
        Method::PUT,
        &format!("/api/cart/{item_id}"),
        Some(json!({ "quantity": 5 })),
        None,
    )
    .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(gateway.cart_lines(user)[0].quantity, 5);

    let removed = send(&app, Method::DELETE, &format!("/api/cart/{item_id}"), None, None).await;
    assert_eq!(removed.status, StatusCode::NO_CONTENT);
    assert!(gateway.cart_lines(user).is_empty());
}

#[tokio::test]
async fn test_cart_proxy_rejections() {
    let gateway = MemoryGateway::new();
    gateway.put_product(product("camisa-campeira", 19_990, None, 0));
    let app = app(gateway.clone(), UNUSED_BACKEND);
    let user = UserId::generate();

    let incomplete = send(
        &app,
        Method::POST,
        "/api/cart",
        Some(json!({ "user_id": user, "product_id": "camisa-campeira", "quantity": 1 })),
        None,
    )
    .await;
    assert_eq!(incomplete.status, StatusCode::BAD_REQUEST);
    assert!(incomplete.error().contains("required"));

    let unknown_product = send(
        &app,
        Method::POST,
        "/api/cart",
        Some(json!({
            "user_id": user,
            "product_id": "nao-existe",
            "quantity": 1,
            "size": "M",
            "color": "Preto"
        })),
        None,
    )
    .await;
    assert_eq!(unknown_product.status, StatusCode::BAD_REQUEST);

    let bad_size = send(
        &app,
        Method::POST,
        "/api/cart",
        Some(json!({
            "user_id": user,
            "product_id": "camisa-campeira",
            "quantity": 1,
            "size": "XG",
            "color": "Preto"
        })),
        None,
    )
    .await;
    assert_eq!(bad_size.status, StatusCode::BAD_REQUEST);
    assert!(bad_size.error().contains("XG"));

    let bad_user = get(&app, "/api/cart/not-a-uuid").await;
    assert_eq!(bad_user.status, StatusCode::BAD_REQUEST);

    let zero = send(
        &app,
        Method::PUT,
        &format!("/api/cart/{}", uuid::Uuid::new_v4()),
        Some(json!({ "quantity": 0 })),
        None,
    )
    .await;
    assert_eq!(zero.status, StatusCode::BAD_REQUEST);

    let unknown_line = send(
        &app,
        Method::PUT,
        &format!("/api/cart/{}", uuid::Uuid::new_v4()),
        Some(json!({ "quantity": 2 })),
        None,
    )
    .await;
    assert_eq!(unknown_line.status, StatusCode::BAD_REQUEST);

    assert!(gateway.cart_lines(user).is_empty());
}

#[tokio::test]
async fn test_clear_cart_by_user() {
    let gateway = MemoryGateway::new();
    gateway.put_product(product("camisa-campeira", 19_990, None, 0));
    let app = app(gateway.clone(), UNUSED_BACKEND);
    let (user, other) = (UserId::generate(), UserId::generate());

    for owner in [user, user, other] {
        let added = send(
            &app,
            Method::POST,
            "/api/cart",
            Some(json!({
                "user_id": owner,
                "product_id": "camisa-campeira",
                "quantity": 1,
                "size": "P",
                "color": "Bege"
            })),
            None,
        )
        .await;
        assert_eq!(added.status, StatusCode::CREATED);
    }

    let cleared = send(&app, Method::DELETE, &format!("/api/cart/user/{user}"), None, None).await;
    assert_eq!(cleared.status, StatusCode::NO_CONTENT);
    assert!(gateway.cart_lines(user).is_empty());
    assert_eq!(gateway.cart_lines(other).len(), 1);
}

// =============================================================================
// Orders
// =============================================================================

async fn seed_order(gateway: &MemoryGateway, user: UserId, centavos: i64) -> String {
    gateway
        .create_order(NewOrder {
            user_id: user,
            total_amount: brl(centavos),
            shipping_address: shipping_address(),
            payment_method: PaymentMethod::CreditCard,
        })
        .await
        .unwrap()
        .id
        .to_string()
}

#[tokio::test]
async fn test_order_listing_filters() {
    let gateway = MemoryGateway::new();
    let (ana, bento) = (UserId::generate(), UserId::generate());
    let shipped = seed_order(&gateway, ana, 10_000).await;
    seed_order(&gateway, ana, 20_000).await;
    seed_order(&gateway, bento, 30_000).await;
    let app = app(gateway, UNUSED_BACKEND);

    let status = send(
        &app,
        Method::PUT,
        &format!("/api/orders/{shipped}"),
        Some(json!({ "status": "shipped" })),
        None,
    )
    .await;
    assert_eq!(status.status, StatusCode::OK);
    assert_eq!(status.json["status"], "shipped");

    let all = get(&app, "/api/orders?status=&user_id=").await;
    assert_eq!(all.json.as_array().unwrap().len(), 3);

    let by_user = get(&app, &format!("/api/orders?user_id={ana}")).await;
    assert_eq!(by_user.json.as_array().unwrap().len(), 2);

    let by_status = get(&app, "/api/orders?status=shipped").await;
    assert_eq!(ids(&by_status), vec![shipped]);

    let bad_status = get(&app, "/api/orders?status=perdido").await;
    assert_eq!(bad_status.status, StatusCode::BAD_REQUEST);

    let bad_user = get(&app, "/api/orders?user_id=ana").await;
    assert_eq!(bad_user.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_order_detail_update_and_delete() {
    let gateway = MemoryGateway::new();
    let order_id = seed_order(&gateway, UserId::generate(), 23_000).await;
    let app = app(gateway.clone(), UNUSED_BACKEND);

    let shown = get(&app, &format!("/api/orders/{order_id}")).await;
    assert_eq!(shown.status, StatusCode::OK);
    assert_eq!(shown.json["total_amount"].as_f64(), Some(230.0));
    assert_eq!(shown.json["status"], "pending");
    assert_eq!(shown.json["shipping_address"]["cidade"], "Bagé");

    let items = get(&app, &format!("/api/orders/{order_id}/items")).await;
    assert_eq!(items.status, StatusCode::OK);
    assert!(items.json.as_array().unwrap().is_empty());

    let mut address = serde_json::to_value(shipping_address()).unwrap();
    address["cep"] = json!("123");
    let bad_address = send(
        &app,
        Method::PUT,
        &format!("/api/orders/{order_id}"),
        Some(json!({ "shipping_address": address })),
        None,
    )
    .await;
    assert_eq!(bad_address.status, StatusCode::BAD_REQUEST);

    let total_edit = send(
        &app,
        Method::PUT,
        &format!("/api/orders/{order_id}"),
        Some(json!({ "total_amount": 1.0 })),
        None,
    )
    .await;
    assert_eq!(total_edit.status, StatusCode::BAD_REQUEST);
    assert_eq!(gateway.orders()[0].total_amount, brl(23_000));

    let deleted = send(&app, Method::DELETE, &format!("/api/orders/{order_id}"), None, None).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let gone = get(&app, &format!("/api/orders/{order_id}")).await;
    assert_eq!(gone.status, StatusCode::BAD_REQUEST);
    assert!(gateway.orders().is_empty());
}
