//! The record store trait.

use async_trait::async_trait;
use common::{CustomerId, OrderId, PaymentId, ProductId};

use crate::Result;
use crate::records::{
    Customer, NewCustomer, NewOrder, NewOrderItem, NewPayment, NewProduct, Order, OrderFilter,
    OrderItem, OrderStatus, Payment, PaymentFilter, PaymentMethod, PaymentStatus, Product,
    ProductFilter, ProductPatch,
};

/// Default cap for list operations.
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// Single-row access to the five record kinds.
///
/// Every method is one independent round trip to the backing store.
/// No method spans multiple record kinds and there is no transaction
/// handle: callers that need multi-row consistency must layer their own
/// compensation protocol on top (see the `domain` crate).
///
/// `get_*` and `delete_*` return `None` for absent rows. `update_*`
/// return `None` when the target row does not exist; any other failure
/// is an `Err`.
#[async_trait]
pub trait RecordStore: Send + Sync {
    // -- products --

    async fn insert_product(&self, new: NewProduct) -> Result<Product>;
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;
    async fn get_product_by_sku(&self, sku: &str) -> Result<Option<Product>>;
    async fn update_product(&self, id: ProductId, patch: ProductPatch) -> Result<Option<Product>>;
    async fn delete_product(&self, id: ProductId) -> Result<Option<Product>>;
    /// Lists products in a stable order, optionally filtered by category.
    async fn list_products(&self, filter: ProductFilter, limit: usize) -> Result<Vec<Product>>;

    // -- customers --

    async fn insert_customer(&self, new: NewCustomer) -> Result<Customer>;
    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>>;
    async fn get_customer_by_email(&self, email: &str) -> Result<Option<Customer>>;
    async fn delete_customer(&self, id: CustomerId) -> Result<Option<Customer>>;
    async fn list_customers(&self, limit: usize) -> Result<Vec<Customer>>;

    // -- orders --

    async fn insert_order(&self, new: NewOrder) -> Result<Order>;
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;
    async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Option<Order>>;
    async fn delete_order(&self, id: OrderId) -> Result<Option<Order>>;
    async fn list_orders(&self, filter: OrderFilter, limit: usize) -> Result<Vec<Order>>;

    // -- order items --

    async fn insert_order_item(&self, new: NewOrderItem) -> Result<OrderItem>;
    /// Lists an order's items in insertion order (= line-item order).
    async fn list_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>>;

    // -- payments --

    async fn insert_payment(&self, new: NewPayment) -> Result<Payment>;
    async fn get_payment(&self, id: PaymentId) -> Result<Option<Payment>>;
    async fn get_payment_by_order(&self, order_id: OrderId) -> Result<Option<Payment>>;
    /// Writes the full payment state (status and method together).
    /// Callers preserving an existing method must pass it back.
    async fn update_payment_state(
        &self,
        id: PaymentId,
        status: PaymentStatus,
        method: Option<PaymentMethod>,
    ) -> Result<Option<Payment>>;
    async fn list_payments(&self, filter: PaymentFilter, limit: usize) -> Result<Vec<Payment>>;
}
