//! Shared types for the retail backend.
//!
//! Identifier newtypes for the four record kinds plus [`Money`], the
//! cents-backed amount type used for all prices and totals.

pub mod ids;
pub mod money;

pub use ids::{CustomerId, OrderId, PaymentId, ProductId};
pub use money::Money;
