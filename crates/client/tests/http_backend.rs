use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde_json::{Value, json};

use stockdesk_billing::{BillingEvent, ScanSource, SystemClock};
use stockdesk_client::types::{BillItem, BillRange, NewBill, StockRequestStatus};
use stockdesk_client::{Backend, BillingSession, ClientConfig, ClientError, HttpBackend, Role};
use stockdesk_core::{Money, ProductId, StockRequestId};
use stockdesk_events::{EventBus, InMemoryEventBus};

const TOKEN: &str = "test-token";

/// In-memory stand-in for the inventory backend.
#[derive(Default)]
struct Shop {
    products: Vec<Value>,
    bills: Vec<Value>,
    last_range: Option<HashMap<String, String>>,
}

type Shared = Arc<Mutex<Shop>>;

fn seeded() -> Shared {
    Arc::new(Mutex::new(Shop {
        products: vec![
            json!({"_id": "LP-101", "name": "Laptop Pro", "category": "Electronics",
                   "price": 1199.99, "quantity": 2, "minStockLevel": 1}),
            json!({"_id": "WC-505", "name": "1080p Webcam", "category": "Electronics",
                   "price": 45, "quantity": 5, "minStockLevel": 10}),
        ],
        ..Shop::default()
    }))
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"))
}

async fn login(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["password"] == "secret1" {
        (
            StatusCode::OK,
            Json(json!({"_id": "u1", "name": "Asha", "email": body["email"],
                        "role": "staff", "token": TOKEN})),
        )
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Invalid email or password"})),
        )
    }
}

async fn list_products(State(shop): State<Shared>, headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    if !authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let shop = shop.lock().unwrap();
    Ok(Json(Value::Array(shop.products.clone())))
}

async fn low_stock(State(shop): State<Shared>) -> Json<Value> {
    let shop = shop.lock().unwrap();
    let low: Vec<Value> = shop
        .products
        .iter()
        .filter(|p| p["quantity"].as_u64() <= p["minStockLevel"].as_u64())
        .cloned()
        .collect();
    Json(Value::Array(low))
}

async fn update_quantity(
    State(shop): State<Shared>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut shop = shop.lock().unwrap();
    match shop.products.iter_mut().find(|p| p["_id"] == id.as_str()) {
        Some(product) => {
            product["quantity"] = body["quantity"].clone();
            (StatusCode::OK, Json(product.clone()))
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"message": "Product not found"})),
        ),
    }
}

async fn create_bill(State(shop): State<Shared>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let mut shop = shop.lock().unwrap();
    let items = body["items"].as_array().cloned().unwrap_or_default();

    for item in &items {
        let wanted = item["quantity"].as_u64().unwrap_or(0);
        let product = shop.products.iter().find(|p| p["_id"] == item["productId"]);
        let in_stock = product.and_then(|p| p["quantity"].as_u64()).unwrap_or(0);
        if wanted > in_stock {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"message": format!("Insufficient stock for {}", item["name"].as_str().unwrap_or("item"))})),
            );
        }
    }

    for item in &items {
        let wanted = item["quantity"].as_u64().unwrap_or(0);
        if let Some(product) = shop.products.iter_mut().find(|p| p["_id"] == item["productId"]) {
            let left = product["quantity"].as_u64().unwrap_or(0) - wanted;
            product["quantity"] = json!(left);
        }
    }

    let bill = json!({
        "_id": format!("B{}", shop.bills.len() + 1),
        "items": items,
        "total": body["total"],
        "createdAt": "2026-10-19T09:30:00Z"
    });
    shop.bills.push(bill.clone());
    (StatusCode::CREATED, Json(bill))
}

async fn bills_in_range(
    State(shop): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let mut shop = shop.lock().unwrap();
    shop.last_range = Some(params);
    Json(Value::Array(shop.bills.clone()))
}

async fn update_request(Path(id): Path<String>, Json(body): Json<Value>) -> Json<Value> {
    Json(json!({
        "_id": id,
        "productId": "WC-505",
        "productName": "1080p Webcam",
        "quantity": 20,
        "status": body["status"]
    }))
}

struct TestServer {
    base_url: String,
    shop: Shared,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let shop = seeded();
        let app = Router::new()
            .route("/api/users/login", post(login))
            .route("/api/products", get(list_products))
            .route("/api/products/low-stock", get(low_stock))
            .route("/api/products/:id/quantity", put(update_quantity))
            .route("/api/bills", post(create_bill))
            .route("/api/bills/range", get(bills_in_range))
            .route("/api/stock-requests/:id", put(update_request))
            .with_state(shop.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}/api", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            shop,
            handle,
        }
    }

    fn backend(&self) -> HttpBackend {
        let backend = HttpBackend::new(self.base_url.clone());
        backend.set_token(Some(TOKEN.to_string()));
        backend
    }

    fn stock_of(&self, id: &str) -> u64 {
        let shop = self.shop.lock().unwrap();
        shop.products
            .iter()
            .find(|p| p["_id"] == id)
            .and_then(|p| p["quantity"].as_u64())
            .unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn login_sets_token_for_later_requests() {
    let srv = TestServer::spawn().await;
    let backend = HttpBackend::new(srv.base_url.clone());

    let session = backend.login("asha@example.com", "secret1").await.unwrap();

    assert_eq!(session.role(), Role::Staff);
    assert_eq!(backend.token().as_deref(), Some(TOKEN));

    let products = backend.list_products().await.unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0].price, Money::from_minor(119_999));
}

#[tokio::test]
async fn backend_error_messages_are_surfaced() {
    let srv = TestServer::spawn().await;
    let backend = HttpBackend::new(srv.base_url.clone());

    let err = backend.login("asha@example.com", "wrong").await.unwrap_err();
    match &err {
        ClientError::Api { status, message } => {
            assert_eq!(*status, 401);
            assert_eq!(message, "Invalid email or password");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.user_message(), "Invalid email or password");
}

#[tokio::test]
async fn missing_body_falls_back_to_generic_message() {
    let srv = TestServer::spawn().await;
    let backend = HttpBackend::new(srv.base_url.clone());

    let err = backend.list_products().await.unwrap_err();

    assert!(matches!(err, ClientError::Api { status: 401, .. }));
    assert_eq!(err.user_message(), "An error occurred");
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    let backend = HttpBackend::new("http://127.0.0.1:9/api");
    let err = backend.list_products().await.unwrap_err();
    assert!(matches!(err, ClientError::Network(_)));
}

#[tokio::test]
async fn bill_refused_for_stock_is_a_conflict() {
    let srv = TestServer::spawn().await;
    let backend = srv.backend();

    let bill = NewBill {
        items: vec![BillItem {
            product_id: ProductId::new("LP-101"),
            name: "Laptop Pro".to_string(),
            quantity: 3,
            price: Money::from_minor(119_999),
        }],
        total: Money::from_minor(359_997),
    };

    let err = backend.create_bill(&bill).await.unwrap_err();

    match err {
        ClientError::StockConflict(message) => assert_eq!(message, "Insufficient stock for Laptop Pro"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(srv.stock_of("LP-101"), 2);
}

#[tokio::test]
async fn range_query_uses_backend_parameter_names() {
    let srv = TestServer::spawn().await;
    let backend = srv.backend();
    let range = BillRange::new(
        NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
    )
    .unwrap();

    let bills = backend.bills_in_range(range).await.unwrap();

    assert!(bills.is_empty());
    let params = srv.shop.lock().unwrap().last_range.clone().unwrap();
    assert_eq!(params.get("startDate").map(String::as_str), Some("2026-10-01"));
    assert_eq!(params.get("endDate").map(String::as_str), Some("2026-10-19"));
}

#[tokio::test]
async fn quantity_and_request_updates_round_trip() {
    let srv = TestServer::spawn().await;
    let backend = srv.backend();

    let updated = backend.update_quantity(&ProductId::new("WC-505"), 40).await.unwrap();
    assert_eq!(updated.quantity, 40);
    assert_eq!(srv.stock_of("WC-505"), 40);

    let low = backend.low_stock_products().await.unwrap();
    assert!(low.is_empty());

    let request = backend
        .update_stock_request(&StockRequestId::new("r1"), StockRequestStatus::Approved)
        .await
        .unwrap();
    assert_eq!(request.status, StockRequestStatus::Approved);

    let missing = backend.update_quantity(&ProductId::new("NOPE"), 1).await.unwrap_err();
    assert!(matches!(missing, ClientError::Api { status: 404, .. }));
}

#[tokio::test]
async fn counter_sells_and_resyncs_against_the_backend() {
    let srv = TestServer::spawn().await;
    let backend = srv.backend();
    let config = ClientConfig {
        api_url: srv.base_url.clone(),
        ..ClientConfig::default()
    };
    let bus = Arc::new(InMemoryEventBus::<BillingEvent>::new());
    let events = bus.subscribe();

    let session = BillingSession::open(&backend, &config, bus, Arc::new(SystemClock))
        .await
        .unwrap();
    session.scan("LP-101", ScanSource::Camera).await.unwrap();
    session.scan("WC-505", ScanSource::Manual).await.unwrap();

    let bill = session.checkout(&backend).await.unwrap();

    assert_eq!(bill.id.as_str(), "B1");
    assert_eq!(bill.total, Money::from_minor(124_499));
    assert_eq!(srv.stock_of("LP-101"), 1);
    assert_eq!(srv.stock_of("WC-505"), 4);
    assert!(session.cart().await.unwrap().is_empty());

    let checked_out = events
        .drain()
        .into_iter()
        .any(|e| matches!(e, BillingEvent::CheckedOut(ref c) if c.bill_id.as_ref().map(|b| b.as_str()) == Some("B1")));
    assert!(checked_out);

    // The snapshot now reflects the backend: one laptop left.
    session.scan("LP-101", ScanSource::Camera).await.unwrap();
    assert_eq!(
        session.cart().await.unwrap().quantity_of(&ProductId::new("LP-101")),
        1
    );
    let repeat = session.scan("  LP-101 ", ScanSource::Manual).await;
    assert!(matches!(repeat, Ok(None)));
}

#[tokio::test]
async fn stale_snapshot_conflict_resyncs_and_keeps_the_cart() {
    let srv = TestServer::spawn().await;
    let backend = srv.backend();
    let config = ClientConfig::default();
    let bus = Arc::new(InMemoryEventBus::<BillingEvent>::new());
    let events = bus.subscribe();

    let session = BillingSession::open(&backend, &config, bus, Arc::new(SystemClock))
        .await
        .unwrap();
    session.scan("LP-101", ScanSource::Camera).await.unwrap();

    // Another register sells the remaining laptops.
    backend.update_quantity(&ProductId::new("LP-101"), 0).await.unwrap();

    let err = session.checkout(&backend).await.unwrap_err();

    assert!(matches!(err, ClientError::StockConflict(_)));
    let cart = session.cart().await.unwrap();
    assert_eq!(cart.quantity_of(&ProductId::new("LP-101")), 1);

    let resynced = events
        .drain()
        .into_iter()
        .find_map(|e| match e {
            BillingEvent::Resynced(r) => Some(r),
            _ => None,
        })
        .unwrap();
    assert_eq!(resynced.shortfalls.len(), 1);
    assert_eq!(resynced.shortfalls[0].in_stock, 0);
}
