use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{CustomerId, OrderId, PaymentId, ProductId};
use tokio::sync::RwLock;

use crate::error::RecordStoreError;
use crate::records::{
    Customer, NewCustomer, NewOrder, NewOrderItem, NewPayment, NewProduct, Order, OrderFilter,
    OrderItem, OrderStatus, Payment, PaymentFilter, PaymentMethod, PaymentStatus, Product,
    ProductFilter, ProductPatch,
};
use crate::store::RecordStore;
use crate::Result;

/// Failure injection switches. Each failpoint makes the matching
/// operation return [`RecordStoreError::Rejected`] so tests can drive
/// every compensation branch of the core protocol.
#[derive(Debug, Default)]
struct FailPoints {
    insert_order: bool,
    insert_order_item: bool,
    insert_payment: bool,
    update_order_status: bool,
    /// `Some(n)`: allow n more product updates, then reject the rest.
    product_updates_left: Option<u32>,
    /// `Some(n)`: allow n more payment updates, then reject the rest.
    payment_updates_left: Option<u32>,
}

#[derive(Debug, Default)]
struct StoreState {
    products: Vec<Product>,
    customers: Vec<Customer>,
    orders: Vec<Order>,
    order_items: Vec<OrderItem>,
    payments: Vec<Payment>,
    failpoints: FailPoints,
}

/// In-memory record store for testing.
///
/// Rows are kept in insertion order, matching the creation-order listing
/// of the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryRecordStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryRecordStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next and all following order inserts fail.
    pub async fn set_fail_on_insert_order(&self, fail: bool) {
        self.state.write().await.failpoints.insert_order = fail;
    }

    /// Makes order-item inserts fail.
    pub async fn set_fail_on_insert_order_item(&self, fail: bool) {
        self.state.write().await.failpoints.insert_order_item = fail;
    }

    /// Makes payment inserts fail.
    pub async fn set_fail_on_insert_payment(&self, fail: bool) {
        self.state.write().await.failpoints.insert_payment = fail;
    }

    /// Makes order status updates fail.
    pub async fn set_fail_on_update_order_status(&self, fail: bool) {
        self.state.write().await.failpoints.update_order_status = fail;
    }

    /// Allows `n` more payment state updates to succeed, then rejects
    /// the rest. Lets tests fail the revert write of the payment
    /// protocol while its forward write succeeds.
    pub async fn fail_payment_updates_after(&self, n: u32) {
        self.state.write().await.failpoints.payment_updates_left = Some(n);
    }

    /// Allows `n` more product updates to succeed, then rejects the
    /// rest. Lets tests fail a stock write mid-protocol, including
    /// inside a compensation pass.
    pub async fn fail_product_updates_after(&self, n: u32) {
        self.state.write().await.failpoints.product_updates_left = Some(n);
    }

    /// Clears the product-update failpoint.
    pub async fn allow_product_updates(&self) {
        self.state.write().await.failpoints.product_updates_left = None;
    }

    fn rejected(entity: &'static str, operation: &'static str) -> RecordStoreError {
        RecordStoreError::Rejected { entity, operation }
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn insert_product(&self, new: NewProduct) -> Result<Product> {
        let mut state = self.state.write().await;
        if state.products.iter().any(|p| p.sku == new.sku) {
            return Err(RecordStoreError::Conflict {
                entity: "product",
                field: "sku",
                value: new.sku,
            });
        }
        let product = Product {
            id: ProductId::new(),
            sku: new.sku,
            name: new.name,
            price: new.price,
            stock: new.stock,
            category: new.category,
        };
        state.products.push(product.clone());
        Ok(product)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let state = self.state.read().await;
        Ok(state.products.iter().find(|p| p.id == id).cloned())
    }

    async fn get_product_by_sku(&self, sku: &str) -> Result<Option<Product>> {
        let state = self.state.read().await;
        Ok(state.products.iter().find(|p| p.sku == sku).cloned())
    }

    async fn update_product(&self, id: ProductId, patch: ProductPatch) -> Result<Option<Product>> {
        let mut state = self.state.write().await;
        if let Some(left) = state.failpoints.product_updates_left {
            if left == 0 {
                return Err(Self::rejected("product", "update"));
            }
            state.failpoints.product_updates_left = Some(left - 1);
        }
        let Some(product) = state.products.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(name) = patch.name {
            product.name = name;
        }
        if let Some(price) = patch.price {
            product.price = price;
        }
        if let Some(stock) = patch.stock {
            product.stock = stock;
        }
        if let Some(category) = patch.category {
            product.category = Some(category);
        }
        Ok(Some(product.clone()))
    }

    async fn delete_product(&self, id: ProductId) -> Result<Option<Product>> {
        let mut state = self.state.write().await;
        let pos = state.products.iter().position(|p| p.id == id);
        Ok(pos.map(|i| state.products.remove(i)))
    }

    async fn list_products(&self, filter: ProductFilter, limit: usize) -> Result<Vec<Product>> {
        let state = self.state.read().await;
        Ok(state
            .products
            .iter()
            .filter(|p| {
                filter
                    .category
                    .as_deref()
                    .is_none_or(|c| p.category.as_deref() == Some(c))
            })
            .take(limit)
            .cloned()
            .collect())
    }

    async fn insert_customer(&self, new: NewCustomer) -> Result<Customer> {
        let mut state = self.state.write().await;
        if state.customers.iter().any(|c| c.email == new.email) {
            return Err(RecordStoreError::Conflict {
                entity: "customer",
                field: "email",
                value: new.email,
            });
        }
        let customer = Customer {
            id: CustomerId::new(),
            name: new.name,
            email: new.email,
            phone: new.phone,
            city: new.city,
        };
        state.customers.push(customer.clone());
        Ok(customer)
    }

    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>> {
        let state = self.state.read().await;
        Ok(state.customers.iter().find(|c| c.id == id).cloned())
    }

    async fn get_customer_by_email(&self, email: &str) -> Result<Option<Customer>> {
        let state = self.state.read().await;
        Ok(state.customers.iter().find(|c| c.email == email).cloned())
    }

    async fn delete_customer(&self, id: CustomerId) -> Result<Option<Customer>> {
        let mut state = self.state.write().await;
        let pos = state.customers.iter().position(|c| c.id == id);
        Ok(pos.map(|i| state.customers.remove(i)))
    }

    async fn list_customers(&self, limit: usize) -> Result<Vec<Customer>> {
        let state = self.state.read().await;
        Ok(state.customers.iter().take(limit).cloned().collect())
    }

    async fn insert_order(&self, new: NewOrder) -> Result<Order> {
        let mut state = self.state.write().await;
        if state.failpoints.insert_order {
            return Err(Self::rejected("order", "insert"));
        }
        let order = Order {
            id: OrderId::new(),
            customer_id: new.customer_id,
            total_amount: new.total_amount,
            status: new.status,
            created_at: Utc::now(),
        };
        state.orders.push(order.clone());
        Ok(order)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let state = self.state.read().await;
        Ok(state.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Option<Order>> {
        let mut state = self.state.write().await;
        if state.failpoints.update_order_status {
            return Err(Self::rejected("order", "status update"));
        }
        let Some(order) = state.orders.iter_mut().find(|o| o.id == id) else {
            return Ok(None);
        };
        order.status = status;
        Ok(Some(order.clone()))
    }

    async fn delete_order(&self, id: OrderId) -> Result<Option<Order>> {
        let mut state = self.state.write().await;
        let pos = state.orders.iter().position(|o| o.id == id);
        Ok(pos.map(|i| state.orders.remove(i)))
    }

    async fn list_orders(&self, filter: OrderFilter, limit: usize) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .iter()
            .filter(|o| {
                filter.customer_id.is_none_or(|c| o.customer_id == c)
                    && filter.status.is_none_or(|s| o.status == s)
            })
            .take(limit)
            .cloned()
            .collect())
    }

    async fn insert_order_item(&self, new: NewOrderItem) -> Result<OrderItem> {
        let mut state = self.state.write().await;
        if state.failpoints.insert_order_item {
            return Err(Self::rejected("order item", "insert"));
        }
        let item = OrderItem {
            order_id: new.order_id,
            product_id: new.product_id,
            quantity: new.quantity,
            price: new.price,
        };
        state.order_items.push(item.clone());
        Ok(item)
    }

    async fn list_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>> {
        let state = self.state.read().await;
        Ok(state
            .order_items
            .iter()
            .filter(|i| i.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn insert_payment(&self, new: NewPayment) -> Result<Payment> {
        let mut state = self.state.write().await;
        if state.failpoints.insert_payment {
            return Err(Self::rejected("payment", "insert"));
        }
        if state.payments.iter().any(|p| p.order_id == new.order_id) {
            return Err(RecordStoreError::Conflict {
                entity: "payment",
                field: "order_id",
                value: new.order_id.to_string(),
            });
        }
        let payment = Payment {
            id: PaymentId::new(),
            order_id: new.order_id,
            amount: new.amount,
            status: new.status,
            method: None,
            created_at: Utc::now(),
        };
        state.payments.push(payment.clone());
        Ok(payment)
    }

    async fn get_payment(&self, id: PaymentId) -> Result<Option<Payment>> {
        let state = self.state.read().await;
        Ok(state.payments.iter().find(|p| p.id == id).cloned())
    }

    async fn get_payment_by_order(&self, order_id: OrderId) -> Result<Option<Payment>> {
        let state = self.state.read().await;
        Ok(state
            .payments
            .iter()
            .find(|p| p.order_id == order_id)
            .cloned())
    }

    async fn update_payment_state(
        &self,
        id: PaymentId,
        status: PaymentStatus,
        method: Option<PaymentMethod>,
    ) -> Result<Option<Payment>> {
        let mut state = self.state.write().await;
        if let Some(left) = state.failpoints.payment_updates_left {
            if left == 0 {
                return Err(Self::rejected("payment", "state update"));
            }
            state.failpoints.payment_updates_left = Some(left - 1);
        }
        let Some(payment) = state.payments.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        payment.status = status;
        payment.method = method;
        Ok(Some(payment.clone()))
    }

    async fn list_payments(&self, filter: PaymentFilter, limit: usize) -> Result<Vec<Payment>> {
        let state = self.state.read().await;
        Ok(state
            .payments
            .iter()
            .filter(|p| filter.status.is_none_or(|s| p.status == s))
            .take(limit)
            .cloned()
            .collect())
    }
}
