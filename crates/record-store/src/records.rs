//! Typed records for the five record kinds, plus their status enums,
//! insert payloads, patch types, and list filters.
//!
//! Records are plain data carried across the store boundary. Enrichment
//! (order + customer + items + payment) lives in composed view types in
//! the `domain` crate, never as mutation of these base records.

use chrono::{DateTime, Utc};
use common::{CustomerId, Money, OrderId, PaymentId, ProductId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// -- Products --

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    /// Unique stock-keeping unit.
    pub sku: String,
    pub name: String,
    /// Current unit price. Order items snapshot this at order time.
    pub price: Money,
    /// On-hand stock. Never negative; adjustments clamp at zero.
    pub stock: i64,
    pub category: Option<String>,
}

/// Insert payload for a product. The store assigns the id.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub price: Money,
    pub stock: i64,
    pub category: Option<String>,
}

/// Partial update for a product. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub price: Option<Money>,
    pub stock: Option<i64>,
    pub category: Option<String>,
}

impl ProductPatch {
    /// Patch that only writes a new stock level.
    pub fn stock(stock: i64) -> Self {
        Self {
            stock: Some(stock),
            ..Self::default()
        }
    }
}

// -- Customers --

/// A customer. Immutable once created as far as the core is concerned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    /// Unique contact email.
    pub email: String,
    pub phone: String,
    pub city: Option<String>,
}

/// Insert payload for a customer.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub city: Option<String>,
}

// -- Orders --

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "PLACED")]
    Placed,
    #[serde(rename = "COMPLETED")]
    Completed,
    #[serde(rename = "CANCELLED")]
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Placed => "PLACED",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error for unrecognized order status strings.
#[derive(Debug, Error)]
#[error("unrecognized order status '{0}'")]
pub struct InvalidOrderStatus(pub String);

impl std::str::FromStr for OrderStatus {
    type Err = InvalidOrderStatus;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "PLACED" => Ok(OrderStatus::Placed),
            "COMPLETED" => Ok(OrderStatus::Completed),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(InvalidOrderStatus(other.to_string())),
        }
    }
}

/// An order header row. Line items are separate [`OrderItem`] rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    /// Sum of line-item price x quantity, frozen at creation.
    pub total_amount: Money,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for an order header.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: CustomerId,
    pub total_amount: Money,
    pub status: OrderStatus,
}

/// A line item. Immutable after creation; `price` is the unit price
/// snapshotted when the order was placed, decoupled from later product
/// price changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: Money,
}

/// Insert payload for a line item.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: Money,
}

// -- Payments --

/// Payment lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "PAID")]
    Paid,
    #[serde(rename = "REFUNDED")]
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Refunded => "REFUNDED",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error for unrecognized payment status strings.
#[derive(Debug, Error)]
#[error("unrecognized payment status '{0}'")]
pub struct InvalidPaymentStatus(pub String);

impl std::str::FromStr for PaymentStatus {
    type Err = InvalidPaymentStatus;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(PaymentStatus::Pending),
            "PAID" => Ok(PaymentStatus::Paid),
            "REFUNDED" => Ok(PaymentStatus::Refunded),
            other => Err(InvalidPaymentStatus(other.to_string())),
        }
    }
}

/// How a payment was settled. Closed set, validated at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    Cash,
    Card,
    #[serde(rename = "UPI")]
    Upi,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Card => "Card",
            PaymentMethod::Upi => "UPI",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error for strings outside the closed payment-method set.
#[derive(Debug, Error)]
#[error("invalid payment method '{0}': must be one of Cash, Card, UPI")]
pub struct InvalidPaymentMethod(pub String);

impl std::str::FromStr for PaymentMethod {
    type Err = InvalidPaymentMethod;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Cash" => Ok(PaymentMethod::Cash),
            "Card" => Ok(PaymentMethod::Card),
            "UPI" => Ok(PaymentMethod::Upi),
            other => Err(InvalidPaymentMethod(other.to_string())),
        }
    }
}

/// A payment row. Exactly one per order, created PENDING alongside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    /// Equals the order total at creation time.
    pub amount: Money,
    pub status: PaymentStatus,
    /// Unset until the payment is processed.
    pub method: Option<PaymentMethod>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a payment.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub order_id: OrderId,
    pub amount: Money,
    pub status: PaymentStatus,
}

// -- List filters --

/// Filter for product listings.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category: Option<String>,
}

/// Filter for order listings.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub customer_id: Option<CustomerId>,
    pub status: Option<OrderStatus>,
}

impl OrderFilter {
    /// Filter selecting one customer's orders.
    pub fn for_customer(customer_id: CustomerId) -> Self {
        Self {
            customer_id: Some(customer_id),
            status: None,
        }
    }

    /// Filter selecting orders in one status.
    pub fn with_status(status: OrderStatus) -> Self {
        Self {
            customer_id: None,
            status: Some(status),
        }
    }
}

/// Filter for payment listings.
#[derive(Debug, Clone, Default)]
pub struct PaymentFilter {
    pub status: Option<PaymentStatus>,
}
