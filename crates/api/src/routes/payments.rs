//! Payment lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::{OrderId, PaymentId};
use record_store::{Order, Payment, PaymentMethod, RecordStore};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;
use crate::routes::parse_id;

#[derive(Deserialize)]
pub struct ProcessPaymentRequest {
    pub method: String,
}

#[derive(Serialize)]
pub struct PaymentResponse {
    pub id: String,
    pub order_id: String,
    pub amount_cents: i64,
    pub status: String,
    pub method: Option<String>,
    pub created_at: String,
}

impl From<Payment> for PaymentResponse {
    fn from(p: Payment) -> Self {
        Self {
            id: p.id.to_string(),
            order_id: p.order_id.to_string(),
            amount_cents: p.amount.cents(),
            status: p.status.to_string(),
            method: p.method.map(|m| m.to_string()),
            created_at: p.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct OrderHeaderResponse {
    pub id: String,
    pub customer_id: String,
    pub status: String,
    pub total_cents: i64,
    pub created_at: String,
}

impl From<Order> for OrderHeaderResponse {
    fn from(o: Order) -> Self {
        Self {
            id: o.id.to_string(),
            customer_id: o.customer_id.to_string(),
            status: o.status.to_string(),
            total_cents: o.total_amount.cents(),
            created_at: o.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct PaymentDetailsResponse {
    pub payment: PaymentResponse,
    pub order: Option<OrderHeaderResponse>,
}

pub(crate) fn parse_method(method: &str) -> Result<PaymentMethod, ApiError> {
    method
        .parse::<PaymentMethod>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// GET /payments/{id} — payment details with its order attached.
#[tracing::instrument(skip(state))]
pub async fn get<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<PaymentDetailsResponse>, ApiError> {
    let payment_id: PaymentId = parse_id(&id)?;
    let details = state.payments.get_payment_details(payment_id).await?;

    Ok(Json(PaymentDetailsResponse {
        payment: details.payment.into(),
        order: details.order.map(Into::into),
    }))
}

/// POST /payments/order/{order_id}/process — process the payment of an
/// order (also completes the order).
#[tracing::instrument(skip(state, req))]
pub async fn process_by_order<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(order_id): Path<String>,
    Json(req): Json<ProcessPaymentRequest>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let order_id: OrderId = parse_id(&order_id)?;
    let method = parse_method(&req.method)?;

    let payment = state
        .payments
        .process_payment_by_order(order_id, method)
        .await?;
    Ok(Json(payment.into()))
}

/// POST /payments/order/{order_id}/refund — refund the payment of an
/// order.
#[tracing::instrument(skip(state))]
pub async fn refund_by_order<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(order_id): Path<String>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let order_id: OrderId = parse_id(&order_id)?;
    let payment = state.payments.refund_payment_by_order(order_id).await?;
    Ok(Json(payment.into()))
}
