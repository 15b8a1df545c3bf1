//! Core domain for the retail backend.
//!
//! This crate owns the order/payment state machine and the
//! compensating-action protocol that keeps stock and statuses
//! consistent over a store that offers no cross-call transactions:
//! - [`InventoryLedger`] — clamped stock adjustments, serialized per
//!   product
//! - [`OrderService`] — order creation, cancellation, and completion
//!   with stock reservation and rollback-on-failure
//! - [`PaymentService`] — the PENDING → PAID → REFUNDED lifecycle and
//!   its coupling to order status
//! - [`CatalogService`] — product and customer administration
//!
//! Compensation passes never hide their own failures: every undo pass
//! yields a [`CompensationReport`] that travels on the primary error.

pub mod catalog;
pub mod compensation;
pub mod error;
pub mod inventory;
pub mod orders;
pub mod payments;
pub mod views;

pub use catalog::CatalogService;
pub use compensation::{CompensationFailure, CompensationReport};
pub use error::{CatalogError, LedgerError, OrderError, PaymentError};
pub use inventory::InventoryLedger;
pub use orders::{OrderLine, OrderService};
pub use payments::PaymentService;
pub use views::{OrderDetails, OrderItemDetails, PaymentDetails};
