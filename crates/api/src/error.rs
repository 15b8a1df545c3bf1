//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{CatalogError, OrderError, PaymentError};
use projections::ReportError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Order lifecycle error.
    Order(OrderError),
    /// Payment lifecycle error.
    Payment(PaymentError),
    /// Catalog/customer admin error.
    Catalog(CatalogError),
    /// Report generation error.
    Report(ReportError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Order(err) => order_error_to_response(err),
            ApiError::Payment(err) => payment_error_to_response(err),
            ApiError::Catalog(err) => catalog_error_to_response(err),
            ApiError::Report(err) => report_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn order_error_to_response(err: OrderError) -> (StatusCode, String) {
    let status = match &err {
        OrderError::CustomerNotFound(_)
        | OrderError::ProductNotFound(_)
        | OrderError::NotFound(_) => StatusCode::NOT_FOUND,
        OrderError::InvalidQuantity(_) => StatusCode::BAD_REQUEST,
        OrderError::InsufficientStock { .. }
        | OrderError::AlreadyCancelled
        | OrderError::AlreadyCompleted
        | OrderError::NotCancellable(_)
        | OrderError::CompleteCancelled => StatusCode::CONFLICT,
        OrderError::PaymentProcessing(inner) => payment_error_to_response_status(inner),
        OrderError::CreationFailed { .. }
        | OrderError::CancellationFailed { .. }
        | OrderError::StatusUpdateFailed
        | OrderError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

fn payment_error_to_response_status(err: &PaymentError) -> StatusCode {
    match err {
        PaymentError::NotFound(_) | PaymentError::NotFoundForOrder(_) => StatusCode::NOT_FOUND,
        PaymentError::AlreadyProcessed
        | PaymentError::ProcessRefunded
        | PaymentError::AlreadyRefunded => StatusCode::CONFLICT,
        PaymentError::CreationFailed(_)
        | PaymentError::ProcessingFailed { .. }
        | PaymentError::RefundFailed(_)
        | PaymentError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn payment_error_to_response(err: PaymentError) -> (StatusCode, String) {
    (payment_error_to_response_status(&err), err.to_string())
}

fn catalog_error_to_response(err: CatalogError) -> (StatusCode, String) {
    let status = match &err {
        CatalogError::DuplicateSku(_) | CatalogError::DuplicateEmail(_) => StatusCode::CONFLICT,
        CatalogError::NegativePrice | CatalogError::NegativeStock => StatusCode::BAD_REQUEST,
        CatalogError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

fn report_error_to_response(err: ReportError) -> (StatusCode, String) {
    let status = match &err {
        ReportError::InvalidLimit | ReportError::InvalidMinOrders => StatusCode::BAD_REQUEST,
        ReportError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        ApiError::Order(err)
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        ApiError::Payment(err)
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        ApiError::Catalog(err)
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        ApiError::Report(err)
    }
}
