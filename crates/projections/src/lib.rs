//! Read-only reporting projections.
//!
//! Aggregate queries over the record store: top sellers, revenue,
//! per-customer order statistics, and an overall sales summary. These
//! are simple read-side projections: they never mutate records and
//! hold no state of their own.

pub mod error;
pub mod reports;

pub use error::{ReportError, Result};
pub use reports::{
    AllReports, CustomerOrdersSummary, RepeatCustomer, Reports, RevenueReport, SalesSummary,
    TopProduct,
};
