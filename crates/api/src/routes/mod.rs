//! Route handlers.

pub mod customers;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod payments;
pub mod products;
pub mod reports;

use crate::error::ApiError;

/// Parses a path segment into a typed UUID id.
pub(crate) fn parse_id<T: From<uuid::Uuid>>(id: &str) -> Result<T, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))?;
    Ok(T::from(uuid))
}
