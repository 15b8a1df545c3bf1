use record_store::RecordStoreError;
use thiserror::Error;

/// Errors from report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// A report limit must be positive.
    #[error("limit must be a positive number")]
    InvalidLimit,

    /// The repeat-customer threshold must be at least 1.
    #[error("minimum orders must be at least 1")]
    InvalidMinOrders,

    /// The store failed a read.
    #[error("store error: {0}")]
    Store(#[from] RecordStoreError),
}

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;
