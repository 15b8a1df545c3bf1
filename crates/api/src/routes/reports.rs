//! Reporting endpoints. Read-only projections over the store.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use chrono::Utc;
use projections::{
    AllReports, CustomerOrdersSummary, RepeatCustomer, RevenueReport, SalesSummary, TopProduct,
};
use record_store::RecordStore;
use serde::Deserialize;

use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct TopProductsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct RepeatCustomersQuery {
    pub min_orders: Option<usize>,
}

/// GET /reports/top-products — best sellers by units sold.
#[tracing::instrument(skip(state))]
pub async fn top_products<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<TopProductsQuery>,
) -> Result<Json<Vec<TopProduct>>, ApiError> {
    let report = state
        .reports
        .top_selling_products(query.limit.unwrap_or(5))
        .await?;
    Ok(Json(report))
}

/// GET /reports/revenue — revenue for the previous calendar month.
#[tracing::instrument(skip(state))]
pub async fn revenue<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<RevenueReport>, ApiError> {
    Ok(Json(state.reports.revenue_last_month(Utc::now()).await?))
}

/// GET /reports/customer-orders — order statistics per customer.
#[tracing::instrument(skip(state))]
pub async fn customer_orders<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<CustomerOrdersSummary>>, ApiError> {
    Ok(Json(state.reports.orders_per_customer().await?))
}

/// GET /reports/repeat-customers — customers with multiple orders.
#[tracing::instrument(skip(state))]
pub async fn repeat_customers<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<RepeatCustomersQuery>,
) -> Result<Json<Vec<RepeatCustomer>>, ApiError> {
    let report = state
        .reports
        .repeat_customers(query.min_orders.unwrap_or(2))
        .await?;
    Ok(Json(report))
}

/// GET /reports/summary — overall sales summary.
#[tracing::instrument(skip(state))]
pub async fn summary<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<SalesSummary>, ApiError> {
    Ok(Json(state.reports.sales_summary().await?))
}

/// GET /reports/all — every report in one bundle.
#[tracing::instrument(skip(state))]
pub async fn all<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<AllReports>, ApiError> {
    Ok(Json(state.reports.all_reports(Utc::now()).await?))
}
