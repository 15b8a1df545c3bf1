//! HTTP API server with observability for the retail backend.
//!
//! Exposes catalog, customer, order, payment, and reporting endpoints
//! over the core services, with structured logging (tracing) and
//! Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use domain::{CatalogService, OrderService, PaymentService};
use metrics_exporter_prometheus::PrometheusHandle;
use projections::Reports;
use record_store::RecordStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState<S: RecordStore + Clone> {
    pub catalog: CatalogService<S>,
    pub orders: OrderService<S>,
    pub payments: PaymentService<S>,
    pub reports: Reports<S>,
}

/// Builds the application state over a record store.
pub fn create_state<S: RecordStore + Clone>(store: S) -> Arc<AppState<S>> {
    let orders = OrderService::new(store.clone());
    let payments = orders.payments().clone();
    Arc::new(AppState {
        catalog: CatalogService::new(store.clone()),
        orders,
        payments,
        reports: Reports::new(store),
    })
}

/// Creates the Axum application router with all routes and shared
/// state.
pub fn create_app<S: RecordStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/products", post(routes::products::create::<S>))
        .route("/products", get(routes::products::list::<S>))
        .route("/products/{id}", get(routes::products::get::<S>))
        .route("/customers", post(routes::customers::create::<S>))
        .route("/customers", get(routes::customers::list::<S>))
        .route("/orders", post(routes::orders::create::<S>))
        .route("/orders", get(routes::orders::list::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}/cancel", post(routes::orders::cancel::<S>))
        .route("/orders/{id}/complete", post(routes::orders::complete::<S>))
        .route("/orders/{id}/pay", post(routes::orders::pay::<S>))
        .route("/payments/{id}", get(routes::payments::get::<S>))
        .route(
            "/payments/order/{order_id}/process",
            post(routes::payments::process_by_order::<S>),
        )
        .route(
            "/payments/order/{order_id}/refund",
            post(routes::payments::refund_by_order::<S>),
        )
        .route(
            "/reports/top-products",
            get(routes::reports::top_products::<S>),
        )
        .route("/reports/revenue", get(routes::reports::revenue::<S>))
        .route(
            "/reports/customer-orders",
            get(routes::reports::customer_orders::<S>),
        )
        .route(
            "/reports/repeat-customers",
            get(routes::reports::repeat_customers::<S>),
        )
        .route("/reports/summary", get(routes::reports::summary::<S>))
        .route("/reports/all", get(routes::reports::all::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
