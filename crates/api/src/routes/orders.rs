//! Order lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{CustomerId, OrderId, ProductId};
use domain::{OrderDetails, OrderLine};
use record_store::{DEFAULT_LIST_LIMIT, RecordStore};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;
use crate::routes::customers::CustomerResponse;
use crate::routes::parse_id;
use crate::routes::payments::{PaymentResponse, parse_method};

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub customer_id: String,
    pub items: Vec<OrderLineRequest>,
}

#[derive(Deserialize)]
pub struct OrderLineRequest {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct CompleteOrderRequest {
    /// Omit to use the legacy status-only completion path.
    #[serde(default)]
    pub method: Option<String>,
}

#[derive(Deserialize)]
pub struct PayOrderRequest {
    pub method: String,
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    pub customer_id: String,
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub product_name: Option<String>,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub customer_id: String,
    pub status: String,
    pub total_cents: i64,
    pub created_at: String,
    pub customer: Option<CustomerResponse>,
    pub items: Vec<OrderItemResponse>,
    pub payment: Option<PaymentResponse>,
}

impl From<OrderDetails> for OrderResponse {
    fn from(details: OrderDetails) -> Self {
        let items = details
            .items
            .into_iter()
            .map(|d| OrderItemResponse {
                product_id: d.item.product_id.to_string(),
                product_name: d.product.map(|p| p.name),
                quantity: d.item.quantity,
                unit_price_cents: d.item.price.cents(),
            })
            .collect();

        Self {
            id: details.order.id.to_string(),
            customer_id: details.order.customer_id.to_string(),
            status: details.order.status.to_string(),
            total_cents: details.order.total_amount.cents(),
            created_at: details.order.created_at.to_rfc3339(),
            customer: details.customer.map(Into::into),
            items,
            payment: details.payment.map(Into::into),
        }
    }
}

/// POST /orders — create an order with its line items.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let customer_id: CustomerId = parse_id(&req.customer_id)?;

    let mut lines = Vec::with_capacity(req.items.len());
    for item in &req.items {
        let product_id: ProductId = parse_id(&item.product_id)?;
        lines.push(OrderLine {
            product_id,
            quantity: item.quantity,
        });
    }

    let details = state.orders.create_order(customer_id, lines).await?;
    Ok((StatusCode::CREATED, Json(details.into())))
}

/// GET /orders/{id} — the full composed view of an order.
#[tracing::instrument(skip(state))]
pub async fn get<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id: OrderId = parse_id(&id)?;
    let details = state.orders.get_order_details(order_id).await?;
    Ok(Json(details.into()))
}

/// GET /orders?customer_id= — list a customer's orders.
#[tracing::instrument(skip(state))]
pub async fn list<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let customer_id: CustomerId = parse_id(&query.customer_id)?;
    let orders = state
        .orders
        .list_customer_orders(customer_id, query.limit.unwrap_or(DEFAULT_LIST_LIMIT))
        .await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// POST /orders/{id}/cancel — cancel a PLACED order.
#[tracing::instrument(skip(state))]
pub async fn cancel<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id: OrderId = parse_id(&id)?;
    let details = state.orders.cancel_order(order_id).await?;
    Ok(Json(details.into()))
}

/// POST /orders/{id}/complete — complete an order, through payment
/// processing when a method is given.
#[tracing::instrument(skip(state, req))]
pub async fn complete<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<CompleteOrderRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id: OrderId = parse_id(&id)?;
    let method = req.method.as_deref().map(parse_method).transpose()?;

    let details = state.orders.complete_order(order_id, method).await?;
    Ok(Json(details.into()))
}

/// POST /orders/{id}/pay — process payment and complete the order.
#[tracing::instrument(skip(state, req))]
pub async fn pay<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<PayOrderRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id: OrderId = parse_id(&id)?;
    let method = parse_method(&req.method)?;

    let details = state.orders.process_order_payment(order_id, method).await?;
    Ok(Json(details.into()))
}
