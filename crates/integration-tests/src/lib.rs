//! Integration test support for Pampa & Poeira.
//!
//! [`MemoryGateway`] implements the storefront data gateway over in-memory
//! tables with the same constraints as the `PostgreSQL` schema (cart lines
//! reference existing products, order lines reference existing orders,
//! deletes cascade). Individual operations can be made to fail with
//! [`MemoryGateway::fail`] to exercise error paths.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p pampa-integration-tests
//! ```
//!
//! No database or network service is needed.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use chrono::{TimeDelta, Utc};
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;
use tower_sessions::MemoryStore;
use url::Url;

use pampa_core::{
    CartItemId, Money, OrderId, OrderItemId, OrderStatus, ProductId, ShippingAddress, UserId,
};
use pampa_storefront::build_router;
use pampa_storefront::config::{StorefrontConfig, SupabaseConfig};
use pampa_storefront::gateway::{
    CartGateway, CatalogGateway, Gateway, GatewayError, OrderGateway,
};
use pampa_storefront::models::{
    CartLine, NewCartItem, NewOrder, NewOrderItem, NewProduct, Order, OrderFilter, OrderItem,
    OrderPatch, Product, ProductFilter, ProductOrder, ProductPatch,
};
use pampa_storefront::state::AppState;

/// Gateway operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    /// Cart line insert, quantity update and delete.
    CartWrite,
    ClearCart,
    CreateOrder,
    InsertOrderItems,
    DeleteOrder,
}

#[derive(Debug, Default)]
struct Tables {
    products: Vec<Product>,
    cart_items: Vec<CartLine>,
    orders: Vec<Order>,
    order_items: Vec<OrderItem>,
    failing: HashSet<FailPoint>,
    lose_orders: bool,
    writes: usize,
}

impl Tables {
    fn check(&self, point: FailPoint) -> Result<(), GatewayError> {
        if self.failing.contains(&point) {
            return Err(GatewayError::Unavailable(format!("{point:?} failed")));
        }
        Ok(())
    }
}

/// In-memory data gateway.
#[derive(Debug, Clone, Default)]
pub struct MemoryGateway {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make `point` fail until [`MemoryGateway::recover`] is called.
    pub fn fail(&self, point: FailPoint) {
        self.tables().failing.insert(point);
    }

    pub fn recover(&self, point: FailPoint) {
        self.tables().failing.remove(&point);
    }

    /// Insert a product directly, bypassing validation and write counting.
    pub fn put_product(&self, product: Product) -> Product {
        let mut tables = self.tables();
        tables.products.retain(|p| p.id != product.id);
        tables.products.push(product.clone());
        product
    }

    /// Drop a product row but keep the cart lines pointing at it.
    ///
    /// This is what a reader sees when the product is deleted between
    /// listing the cart and joining its products.
    pub fn orphan_product(&self, id: &ProductId) {
        self.tables().products.retain(|p| &p.id != id);
    }

    /// Acknowledge new orders without keeping them, as if each header were
    /// deleted right after it was written.
    pub fn lose_orders(&self) {
        self.tables().lose_orders = true;
    }

    /// Number of successful write calls so far.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.tables().writes
    }

    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        self.tables().orders.clone()
    }

    #[must_use]
    pub fn order_items(&self) -> Vec<OrderItem> {
        self.tables().order_items.clone()
    }

    #[must_use]
    pub fn cart_lines(&self, user_id: UserId) -> Vec<CartLine> {
        self.tables()
            .cart_items
            .iter()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect()
    }
}

impl CatalogGateway for MemoryGateway {
    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>, GatewayError> {
        let mut products: Vec<Product> = self
            .tables()
            .products
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        match filter.order {
            ProductOrder::NewestFirst => products.sort_by(|a, b| {
                b.created_at
                    .cmp(&a.created_at)
                    .then_with(|| a.id.cmp(&b.id))
            }),
            ProductOrder::IdDescending => products.sort_by(|a, b| b.id.cmp(&a.id)),
        }
        if let Some(limit) = filter.limit {
            products.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }
        Ok(products)
    }

    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, GatewayError> {
        Ok(self.tables().products.iter().find(|p| &p.id == id).cloned())
    }

    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, GatewayError> {
        Ok(self
            .tables()
            .products
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn create_product(
        &self,
        id: ProductId,
        product: NewProduct,
    ) -> Result<Product, GatewayError> {
        let mut tables = self.tables();
        if tables.products.iter().any(|p| p.id == id) {
            return Err(GatewayError::Conflict(format!("duplicate key ({id})")));
        }
        let created = Product {
            id,
            name: product.name,
            description: product.description,
            price: product.price,
            promotional_price: product.promotional_price,
            category: product.category,
            is_featured: product.is_featured,
            is_new_collection: product.is_new_collection,
            images: product.images,
            primary_image: product.primary_image,
            sizes: product.sizes,
            colors: product.colors,
            created_at: Utc::now(),
        };
        tables.products.push(created.clone());
        tables.writes += 1;
        Ok(created)
    }

    async fn update_product(
        &self,
        id: &ProductId,
        patch: ProductPatch,
    ) -> Result<Option<Product>, GatewayError> {
        let mut tables = self.tables();
        let Some(product) = tables.products.iter_mut().find(|p| &p.id == id) else {
            return Ok(None);
        };
        if let Some(name) = patch.name {
            product.name = name;
        }
        if let Some(description) = patch.description {
            product.description = description;
        }
        if let Some(price) = patch.price {
            product.price = price;
        }
        if let Some(promotional_price) = patch.promotional_price {
            product.promotional_price = promotional_price;
        }
        if let Some(category) = patch.category {
            product.category = category;
        }
        if let Some(is_featured) = patch.is_featured {
            product.is_featured = is_featured;
        }
        if let Some(is_new_collection) = patch.is_new_collection {
            product.is_new_collection = is_new_collection;
        }
        if let Some(images) = patch.images {
            product.images = images;
        }
        if let Some(primary_image) = patch.primary_image {
            product.primary_image = primary_image;
        }
        if let Some(sizes) = patch.sizes {
            product.sizes = sizes;
        }
        if let Some(colors) = patch.colors {
            product.colors = colors;
        }
        let updated = product.clone();
        tables.writes += 1;
        Ok(Some(updated))
    }

    async fn delete_product(&self, id: &ProductId) -> Result<bool, GatewayError> {
        let mut tables = self.tables();
        let before = tables.products.len();
        tables.products.retain(|p| &p.id != id);
        tables.cart_items.retain(|l| &l.product_id != id);
        tables.writes += 1;
        Ok(tables.products.len() < before)
    }
}

impl CartGateway for MemoryGateway {
    async fn list_cart_items(&self, user_id: UserId) -> Result<Vec<CartLine>, GatewayError> {
        Ok(self.cart_lines(user_id))
    }

    async fn insert_cart_item(&self, item: NewCartItem) -> Result<CartLine, GatewayError> {
        let mut tables = self.tables();
        tables.check(FailPoint::CartWrite)?;
        if !tables.products.iter().any(|p| p.id == item.product_id) {
            return Err(GatewayError::Conflict(format!(
                "referenced row does not exist ({})",
                item.product_id
            )));
        }
        // Strictly increasing timestamps keep "oldest first" deterministic.
        let created_at = tables
            .cart_items
            .last()
            .map_or_else(Utc::now, |last| last.created_at + TimeDelta::milliseconds(1))
            .max(Utc::now());
        let line = CartLine {
            id: CartItemId::generate(),
            user_id: item.user_id,
            product_id: item.product_id,
            quantity: item.quantity,
            size: item.size,
            color: item.color,
            created_at,
        };
        tables.cart_items.push(line.clone());
        tables.writes += 1;
        Ok(line)
    }

    async fn update_cart_item_quantity(
        &self,
        id: CartItemId,
        quantity: u32,
    ) -> Result<bool, GatewayError> {
        let mut tables = self.tables();
        tables.check(FailPoint::CartWrite)?;
        tables.writes += 1;
        let Some(line) = tables.cart_items.iter_mut().find(|l| l.id == id) else {
            return Ok(false);
        };
        line.quantity = quantity;
        Ok(true)
    }

    async fn delete_cart_item(&self, id: CartItemId) -> Result<bool, GatewayError> {
        let mut tables = self.tables();
        tables.check(FailPoint::CartWrite)?;
        let before = tables.cart_items.len();
        tables.cart_items.retain(|l| l.id != id);
        tables.writes += 1;
        Ok(tables.cart_items.len() < before)
    }

    async fn clear_cart(&self, user_id: UserId) -> Result<u64, GatewayError> {
        let mut tables = self.tables();
        tables.check(FailPoint::ClearCart)?;
        let before = tables.cart_items.len();
        tables.cart_items.retain(|l| l.user_id != user_id);
        tables.writes += 1;
        Ok(u64::try_from(before - tables.cart_items.len()).unwrap_or(u64::MAX))
    }
}

impl OrderGateway for MemoryGateway {
    async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<Order>, GatewayError> {
        let mut orders: Vec<Order> = self
            .tables()
            .orders
            .iter()
            .filter(|o| filter.matches(o))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, GatewayError> {
        Ok(self.tables().orders.iter().find(|o| o.id == id).cloned())
    }

    async fn create_order(&self, order: NewOrder) -> Result<Order, GatewayError> {
        let mut tables = self.tables();
        tables.check(FailPoint::CreateOrder)?;
        let created = Order {
            id: OrderId::generate(),
            user_id: order.user_id,
            status: OrderStatus::Pending,
            total_amount: order.total_amount,
            shipping_address: order.shipping_address,
            payment_method: order.payment_method,
            created_at: Utc::now(),
        };
        if !tables.lose_orders {
            tables.orders.push(created.clone());
        }
        tables.writes += 1;
        Ok(created)
    }

    async fn insert_order_items(
        &self,
        items: Vec<NewOrderItem>,
    ) -> Result<Vec<OrderItem>, GatewayError> {
        let mut tables = self.tables();
        tables.check(FailPoint::InsertOrderItems)?;
        for item in &items {
            if !tables.orders.iter().any(|o| o.id == item.order_id) {
                return Err(GatewayError::Conflict(format!(
                    "referenced row does not exist ({})",
                    item.order_id
                )));
            }
        }
        let inserted: Vec<OrderItem> = items
            .into_iter()
            .map(|item| OrderItem {
                id: OrderItemId::generate(),
                order_id: item.order_id,
                product_id: item.product_id,
                quantity: item.quantity,
                price_at_time: item.price_at_time,
                size: item.size,
                color: item.color,
            })
            .collect();
        tables.order_items.extend(inserted.iter().cloned());
        tables.writes += 1;
        Ok(inserted)
    }

    async fn list_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, GatewayError> {
        Ok(self
            .tables()
            .order_items
            .iter()
            .filter(|i| i.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn update_order(
        &self,
        id: OrderId,
        patch: OrderPatch,
    ) -> Result<Option<Order>, GatewayError> {
        let mut tables = self.tables();
        let Some(order) = tables.orders.iter_mut().find(|o| o.id == id) else {
            return Ok(None);
        };
        if let Some(status) = patch.status {
            order.status = status;
        }
        if let Some(address) = patch.shipping_address {
            order.shipping_address = address;
        }
        let updated = order.clone();
        tables.writes += 1;
        Ok(Some(updated))
    }

    async fn delete_order(&self, id: OrderId) -> Result<bool, GatewayError> {
        let mut tables = self.tables();
        tables.check(FailPoint::DeleteOrder)?;
        let before = tables.orders.len();
        tables.orders.retain(|o| o.id != id);
        tables.order_items.retain(|i| i.order_id != id);
        tables.writes += 1;
        Ok(tables.orders.len() < before)
    }
}

impl Gateway for MemoryGateway {
    async fn ping(&self) -> Result<(), GatewayError> {
        Ok(())
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// Amount in centavos as [`Money`].
///
/// # Panics
///
/// Panics on a negative amount.
#[must_use]
pub fn brl(centavos: i64) -> Money {
    Money::from_minor(centavos).unwrap_or_else(|e| panic!("bad fixture amount {centavos}: {e}"))
}

/// A product offered in sizes P/M/G and colors Preto/Bege.
///
/// `age_secs` shifts `created_at` into the past so listings have a stable order.
///
/// # Panics
///
/// Panics on an invalid id or negative amount.
#[must_use]
pub fn product(id: &str, price: i64, promotional_price: Option<i64>, age_secs: i64) -> Product {
    Product {
        id: ProductId::parse(id).unwrap_or_else(|e| panic!("bad fixture id {id}: {e}")),
        name: format!("Produto {id}"),
        description: String::new(),
        price: brl(price),
        promotional_price: promotional_price.map(brl),
        category: Some("Camisas".to_string()),
        is_featured: false,
        is_new_collection: false,
        images: vec![],
        primary_image: None,
        sizes: vec!["P".to_string(), "M".to_string(), "G".to_string()],
        colors: vec!["Preto".to_string(), "Bege".to_string()],
        created_at: Utc::now() - TimeDelta::seconds(age_secs),
    }
}

/// A valid delivery address in Bagé, RS.
#[must_use]
pub fn shipping_address() -> ShippingAddress {
    ShippingAddress {
        postal_code: "96400-000".to_string(),
        street: "Rua General Osório".to_string(),
        number: "1020".to_string(),
        complement: None,
        neighborhood: "Centro".to_string(),
        city: "Bagé".to_string(),
        state: "RS".to_string(),
    }
}

/// Server configuration pointing the managed backend at `backend_url`.
///
/// # Panics
///
/// Panics if `backend_url` is not a URL.
#[must_use]
pub fn test_config(backend_url: &str) -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("postgres://localhost/pampa_test"),
        host: std::net::IpAddr::from([127, 0, 0, 1]),
        port: 0,
        base_url: "http://localhost:3001".to_string(),
        supabase: SupabaseConfig {
            url: Url::parse(backend_url)
                .unwrap_or_else(|e| panic!("bad backend url {backend_url}: {e}")),
            service_role_key: SecretString::from("t3st-K9v2Qm7xLp4Rz"),
            storage_bucket: "produtos".to_string(),
        },
        gateway_timeout: Duration::from_secs(2),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

// =============================================================================
// HTTP
// =============================================================================

/// The full application router over `gateway` with an in-memory session store.
///
/// # Panics
///
/// Panics if the application state cannot be built.
#[must_use]
pub fn app(gateway: MemoryGateway, backend_url: &str) -> Router {
    let state = AppState::new(test_config(backend_url), gateway)
        .unwrap_or_else(|e| panic!("failed to build state: {e}"));
    build_router(state, MemoryStore::default())
}

/// A response with its body parsed as JSON (`Value::Null` when empty or not JSON).
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub json: Value,
}

impl TestResponse {
    /// The `error` message of an API error body.
    #[must_use]
    pub fn error(&self) -> &str {
        self.json["error"].as_str().unwrap_or_default()
    }

    /// The `name=value` part of the session cookie set by this response.
    #[must_use]
    pub fn session_cookie(&self) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find(|value| value.starts_with("pampa_session="))
            .and_then(|value| value.split(';').next())
            .map(String::from)
    }
}

/// Send one request through `app`.
///
/// # Panics
///
/// Panics if the request cannot be built or the router fails.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    cookie: Option<&str>,
) -> TestResponse {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(json) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap_or_else(|e| panic!("bad request {uri}: {e}"));

    let response = app
        .clone()
        .oneshot(request)
        .await
        .unwrap_or_else(|e| panic!("router failed on {uri}: {e}"));
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap_or_else(|e| panic!("unreadable body from {uri}: {e}"));
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    TestResponse {
        status,
        headers,
        json,
    }
}
