//! Composed read views.
//!
//! Enrichment (order + customer + items + payment) is expressed as
//! dedicated view types assembled from base records, never as mutation
//! of a record fetched from the store. Embedded references are
//! optional: a referenced row can be absent (deleted product, order
//! without a payment) and readers must tolerate that.

use common::Money;
use record_store::{Customer, Order, OrderItem, Payment, Product};

/// A line item together with its product, when the product still
/// exists.
#[derive(Debug, Clone)]
pub struct OrderItemDetails {
    pub item: OrderItem,
    pub product: Option<Product>,
}

/// An order with its customer, line items, and payment.
#[derive(Debug, Clone)]
pub struct OrderDetails {
    pub order: Order,
    pub customer: Option<Customer>,
    pub items: Vec<OrderItemDetails>,
    /// Absent when payment creation failed at order time: completion
    /// and reporting flows tolerate an order without a payment record.
    pub payment: Option<Payment>,
}

impl OrderDetails {
    /// Recomputes the total from the line items. Equals
    /// `order.total_amount` for every well-formed order.
    pub fn computed_total(&self) -> Money {
        self.items
            .iter()
            .map(|d| d.item.price.multiply(d.item.quantity))
            .sum()
    }
}

/// A payment with its order attached.
#[derive(Debug, Clone)]
pub struct PaymentDetails {
    pub payment: Payment,
    pub order: Option<Order>,
}
