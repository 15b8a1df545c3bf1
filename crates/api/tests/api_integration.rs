//! Integration tests for the API server.

use std::sync::OnceLock;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use record_store::InMemoryRecordStore;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            metrics_exporter_prometheus::PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> axum::Router {
    let store = InMemoryRecordStore::new();
    let state = api::create_state(store);
    api::create_app(state, get_metrics_handle())
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let request = match body {
        Some(json) => Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&json).unwrap()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn seed_product(app: &axum::Router, sku: &str, price_cents: i64, stock: i64) -> String {
    let (status, json) = send(
        app,
        "POST",
        "/products",
        Some(serde_json::json!({
            "name": format!("Product {sku}"),
            "sku": sku,
            "price_cents": price_cents,
            "stock": stock,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json["id"].as_str().unwrap().to_string()
}

async fn seed_customer(app: &axum::Router, email: &str) -> String {
    let (status, json) = send(
        app,
        "POST",
        "/customers",
        Some(serde_json::json!({
            "name": "Jane",
            "email": email,
            "phone": "555-0100",
            "city": "Madrid",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();
    let (status, json) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_create_and_pay_order() {
    let app = setup();
    let product_id = seed_product(&app, "SKU-001", 500, 10).await;
    let customer_id = seed_customer(&app, "jane@example.com").await;

    let (status, order) = send(
        &app,
        "POST",
        "/orders",
        Some(serde_json::json!({
            "customer_id": customer_id,
            "items": [{"product_id": product_id, "quantity": 3}],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["status"], "PLACED");
    assert_eq!(order["total_cents"], 1500);
    assert_eq!(order["payment"]["status"], "PENDING");
    assert_eq!(order["payment"]["amount_cents"], 1500);

    // Stock was deducted.
    let (_, product) = send(&app, "GET", &format!("/products/{product_id}"), None).await;
    assert_eq!(product["stock"], 7);

    // Pay by card -> COMPLETED/PAID.
    let order_id = order["id"].as_str().unwrap();
    let (status, paid) = send(
        &app,
        "POST",
        &format!("/orders/{order_id}/pay"),
        Some(serde_json::json!({"method": "Card"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paid["status"], "COMPLETED");
    assert_eq!(paid["payment"]["status"], "PAID");
    assert_eq!(paid["payment"]["method"], "Card");

    // Paying again conflicts.
    let (status, _) = send(
        &app,
        "POST",
        &format!("/orders/{order_id}/pay"),
        Some(serde_json::json!({"method": "Cash"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_insufficient_stock_conflicts() {
    let app = setup();
    let product_id = seed_product(&app, "SKU-001", 500, 2).await;
    let customer_id = seed_customer(&app, "jane@example.com").await;

    let (status, json) = send(
        &app,
        "POST",
        "/orders",
        Some(serde_json::json!({
            "customer_id": customer_id,
            "items": [{"product_id": product_id, "quantity": 5}],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    let message = json["error"].as_str().unwrap();
    assert!(message.contains("insufficient stock"));
    assert!(message.contains("available 2"));
    assert!(message.contains("requested 5"));

    // Stock untouched.
    let (_, product) = send(&app, "GET", &format!("/products/{product_id}"), None).await;
    assert_eq!(product["stock"], 2);
}

#[tokio::test]
async fn test_cancel_restores_stock_and_refunds() {
    let app = setup();
    let product_id = seed_product(&app, "SKU-001", 500, 10).await;
    let customer_id = seed_customer(&app, "jane@example.com").await;

    let (_, order) = send(
        &app,
        "POST",
        "/orders",
        Some(serde_json::json!({
            "customer_id": customer_id,
            "items": [{"product_id": product_id, "quantity": 4}],
        })),
    )
    .await;
    let order_id = order["id"].as_str().unwrap();

    let (status, cancelled) = send(
        &app,
        "POST",
        &format!("/orders/{order_id}/cancel"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "CANCELLED");
    assert_eq!(cancelled["payment"]["status"], "REFUNDED");

    let (_, product) = send(&app, "GET", &format!("/products/{product_id}"), None).await;
    assert_eq!(product["stock"], 10);

    // A second cancel conflicts.
    let (status, json) = send(
        &app,
        "POST",
        &format!("/orders/{order_id}/cancel"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["error"].as_str().unwrap().contains("already cancelled"));
}

#[tokio::test]
async fn test_invalid_payment_method_is_bad_request() {
    let app = setup();
    let product_id = seed_product(&app, "SKU-001", 500, 10).await;
    let customer_id = seed_customer(&app, "jane@example.com").await;

    let (_, order) = send(
        &app,
        "POST",
        "/orders",
        Some(serde_json::json!({
            "customer_id": customer_id,
            "items": [{"product_id": product_id, "quantity": 1}],
        })),
    )
    .await;
    let order_id = order["id"].as_str().unwrap();

    let (status, json) = send(
        &app,
        "POST",
        &format!("/orders/{order_id}/pay"),
        Some(serde_json::json!({"method": "Cheque"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("Cash, Card, UPI"));
}

#[tokio::test]
async fn test_legacy_complete_without_method() {
    let app = setup();
    let product_id = seed_product(&app, "SKU-001", 500, 10).await;
    let customer_id = seed_customer(&app, "jane@example.com").await;

    let (_, order) = send(
        &app,
        "POST",
        "/orders",
        Some(serde_json::json!({
            "customer_id": customer_id,
            "items": [{"product_id": product_id, "quantity": 1}],
        })),
    )
    .await;
    let order_id = order["id"].as_str().unwrap();

    let (status, completed) = send(
        &app,
        "POST",
        &format!("/orders/{order_id}/complete"),
        Some(serde_json::json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(completed["status"], "COMPLETED");
    // The legacy path leaves the payment PENDING.
    assert_eq!(completed["payment"]["status"], "PENDING");
}

#[tokio::test]
async fn test_unknown_order_is_not_found() {
    let app = setup();
    let missing = uuid::Uuid::new_v4();

    let (status, _) = send(&app, "GET", &format!("/orders/{missing}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "GET", "/orders/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_duplicate_sku_conflicts() {
    let app = setup();
    seed_product(&app, "SKU-001", 500, 10).await;

    let (status, json) = send(
        &app,
        "POST",
        "/products",
        Some(serde_json::json!({
            "name": "Widget",
            "sku": "SKU-001",
            "price_cents": 100,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["error"].as_str().unwrap().contains("SKU-001"));
}

#[tokio::test]
async fn test_reports_after_sales() {
    let app = setup();
    let product_id = seed_product(&app, "SKU-001", 1000, 10).await;
    let customer_id = seed_customer(&app, "jane@example.com").await;

    for quantity in [1, 2] {
        let (_, order) = send(
            &app,
            "POST",
            "/orders",
            Some(serde_json::json!({
                "customer_id": customer_id,
                "items": [{"product_id": product_id, "quantity": quantity}],
            })),
        )
        .await;
        let order_id = order["id"].as_str().unwrap();
        let (status, _) = send(
            &app,
            "POST",
            &format!("/orders/{order_id}/pay"),
            Some(serde_json::json!({"method": "UPI"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, summary) = send(&app, "GET", "/reports/summary", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["total_orders"], 2);
    assert_eq!(summary["completed_orders"], 2);
    assert_eq!(summary["total_revenue"], 3000);

    let (status, top) = send(&app, "GET", "/reports/top-products?limit=3", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(top[0]["sku"], "SKU-001");
    assert_eq!(top[0]["total_quantity_sold"], 3);

    let (status, customers) = send(&app, "GET", "/reports/customer-orders", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(customers[0]["total_orders"], 2);

    let (status, _) = send(&app, "GET", "/reports/all", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_list_customer_orders() {
    let app = setup();
    let product_id = seed_product(&app, "SKU-001", 500, 10).await;
    let customer_id = seed_customer(&app, "jane@example.com").await;

    for _ in 0..2 {
        send(
            &app,
            "POST",
            "/orders",
            Some(serde_json::json!({
                "customer_id": customer_id,
                "items": [{"product_id": product_id, "quantity": 1}],
            })),
        )
        .await;
    }

    let (status, orders) = send(
        &app,
        "GET",
        &format!("/orders?customer_id={customer_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(orders.as_array().unwrap().len(), 2);
    assert_eq!(orders[0]["customer"]["email"], "jane@example.com");
}
