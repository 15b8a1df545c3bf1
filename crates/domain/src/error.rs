//! Domain error taxonomy.
//!
//! Every failure surfaced to a caller is a distinct variant with a
//! distinct message. Validation failures fire before any mutation;
//! `CreationFailed`/`CancellationFailed`/`ProcessingFailed` wrap
//! failures that happened mid-protocol and carry the outcome of the
//! compensation pass that followed.

use common::{CustomerId, OrderId, PaymentId, ProductId};
use record_store::{OrderStatus, RecordStoreError};
use thiserror::Error;

use crate::compensation::CompensationReport;

/// Errors from the inventory ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The product row does not exist.
    #[error("product {0} not found")]
    ProductMissing(ProductId),

    /// The store failed the read or the write.
    #[error(transparent)]
    Store(#[from] RecordStoreError),
}

/// Errors from the order lifecycle manager.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("customer {0} not found")]
    CustomerNotFound(CustomerId),

    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    #[error("quantity must be positive for product {0}")]
    InvalidQuantity(ProductId),

    #[error(
        "insufficient stock for product {name} ({product_id}): available {available}, requested {requested}"
    )]
    InsufficientStock {
        product_id: ProductId,
        name: String,
        available: i64,
        requested: u32,
    },

    #[error("order {0} not found")]
    NotFound(OrderId),

    /// Idempotency guard: an order cannot be cancelled twice.
    #[error("order is already cancelled")]
    AlreadyCancelled,

    /// Idempotency guard: an order cannot be completed twice.
    #[error("order is already completed")]
    AlreadyCompleted,

    #[error("cannot cancel order with status {0}: only PLACED orders can be cancelled")]
    NotCancellable(OrderStatus),

    #[error("cannot complete a cancelled order")]
    CompleteCancelled,

    /// A step after stock deduction failed. Stock restoration was
    /// attempted; its outcome is in the report.
    #[error("order creation failed: {reason}{compensation}")]
    CreationFailed {
        reason: String,
        compensation: CompensationReport,
    },

    /// A step after stock restoration failed. Stock was re-deducted on
    /// a best-effort basis; the outcome is in the report.
    #[error("order cancellation failed: {reason}{compensation}")]
    CancellationFailed {
        reason: String,
        compensation: CompensationReport,
    },

    /// The legacy completion path could not flip the order status.
    #[error("failed to update order status")]
    StatusUpdateFailed,

    #[error("payment processing failed: {0}")]
    PaymentProcessing(#[from] PaymentError),

    #[error("store error: {0}")]
    Store(#[from] RecordStoreError),
}

/// Errors from the payment lifecycle manager.
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("payment {0} not found")]
    NotFound(PaymentId),

    #[error("no payment found for order {0}")]
    NotFoundForOrder(OrderId),

    /// Idempotency guard: a PAID payment cannot be processed again.
    #[error("payment is already processed")]
    AlreadyProcessed,

    /// Refunded payments never re-enter the processable state.
    #[error("cannot process a refunded payment")]
    ProcessRefunded,

    /// Idempotency guard: a payment cannot be refunded twice.
    #[error("payment is already refunded")]
    AlreadyRefunded,

    #[error("payment creation failed: {0}")]
    CreationFailed(String),

    /// The order-status update after marking the payment PAID failed.
    /// The payment was reverted to PENDING; the revert's outcome is in
    /// the report.
    #[error("payment processing failed: {reason}{compensation}")]
    ProcessingFailed {
        reason: String,
        compensation: CompensationReport,
    },

    #[error("payment refund failed: {0}")]
    RefundFailed(String),

    #[error("store error: {0}")]
    Store(#[from] RecordStoreError),
}

/// Errors from catalog and customer administration.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("a product with sku '{0}' already exists")]
    DuplicateSku(String),

    #[error("a customer with email '{0}' already exists")]
    DuplicateEmail(String),

    #[error("price must not be negative")]
    NegativePrice,

    #[error("stock must not be negative")]
    NegativeStock,

    #[error("store error: {0}")]
    Store(#[from] RecordStoreError),
}
