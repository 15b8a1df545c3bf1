//! Customer admin endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use record_store::{Customer, DEFAULT_LIST_LIMIT, NewCustomer, RecordStore};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct CreateCustomerRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub city: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListCustomersQuery {
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct CustomerResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub city: Option<String>,
}

impl From<Customer> for CustomerResponse {
    fn from(c: Customer) -> Self {
        Self {
            id: c.id.to_string(),
            name: c.name,
            email: c.email,
            phone: c.phone,
            city: c.city,
        }
    }
}

/// POST /customers — register a customer.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<CustomerResponse>), ApiError> {
    let customer = state
        .catalog
        .add_customer(NewCustomer {
            name: req.name,
            email: req.email,
            phone: req.phone,
            city: req.city,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(customer.into())))
}

/// GET /customers — list customers.
#[tracing::instrument(skip(state))]
pub async fn list<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<ListCustomersQuery>,
) -> Result<Json<Vec<CustomerResponse>>, ApiError> {
    let customers = state
        .catalog
        .list_customers(query.limit.unwrap_or(DEFAULT_LIST_LIMIT))
        .await?;
    Ok(Json(customers.into_iter().map(Into::into).collect()))
}
