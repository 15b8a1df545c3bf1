//! Order lifecycle manager.
//!
//! Owns the stock-reservation and compensation protocol. Every
//! multi-step operation here runs as a sequence of independent store
//! calls with no surrounding transaction: forward actions are applied
//! one by one, the applied ones are remembered, and a failure triggers
//! an undo pass over them in reverse order. The undo pass is itself
//! best-effort: its failures are logged, collected into a
//! [`CompensationReport`], and attached to the primary error rather
//! than escalating it. A caller can therefore receive a failure while
//! stock was not perfectly restored; the report is what makes that
//! state visible.

use std::sync::Arc;

use common::{CustomerId, Money, OrderId, ProductId};
use record_store::{
    NewOrder, NewOrderItem, Order, OrderFilter, OrderStatus, PaymentMethod, Product, RecordStore,
};

use crate::compensation::CompensationReport;
use crate::error::OrderError;
use crate::inventory::InventoryLedger;
use crate::payments::PaymentService;
use crate::views::{OrderDetails, OrderItemDetails};

/// One requested line of a new order.
#[derive(Debug, Clone)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A line that passed validation, with the product and unit price
/// snapshotted at validation time.
struct ValidatedLine {
    product: Product,
    quantity: u32,
    unit_price: Money,
}

/// Service for creating, cancelling, and completing orders.
pub struct OrderService<S: RecordStore + Clone> {
    store: S,
    ledger: Arc<InventoryLedger<S>>,
    payments: PaymentService<S>,
}

impl<S: RecordStore + Clone> OrderService<S> {
    /// Creates a new order service with the given store.
    pub fn new(store: S) -> Self {
        Self {
            ledger: Arc::new(InventoryLedger::new(store.clone())),
            payments: PaymentService::new(store.clone()),
            store,
        }
    }

    /// The payment service this order service delegates to.
    pub fn payments(&self) -> &PaymentService<S> {
        &self.payments
    }

    /// Creates an order for a customer.
    ///
    /// Validates the customer, the products, the quantities, and the
    /// available stock, then runs the creation protocol: deduct stock
    /// for every line (before the order row exists), insert the order
    /// and its items, and attempt a PENDING payment for the total.
    ///
    /// Stock or order failures roll back. A payment-creation failure
    /// does not: the order is still returned, without a payment.
    #[tracing::instrument(skip(self, lines), fields(line_count = lines.len()))]
    pub async fn create_order(
        &self,
        customer_id: CustomerId,
        lines: Vec<OrderLine>,
    ) -> Result<OrderDetails, OrderError> {
        metrics::counter!("orders_create_attempts_total").increment(1);
        let started = std::time::Instant::now();

        let customer = self
            .store
            .get_customer(customer_id)
            .await?
            .ok_or(OrderError::CustomerNotFound(customer_id))?;

        // Fail fast: validate everything before touching stock.
        let mut validated = Vec::with_capacity(lines.len());
        for line in &lines {
            if line.quantity == 0 {
                return Err(OrderError::InvalidQuantity(line.product_id));
            }
            let product = self
                .store
                .get_product(line.product_id)
                .await?
                .ok_or(OrderError::ProductNotFound(line.product_id))?;
            if product.stock < i64::from(line.quantity) {
                return Err(OrderError::InsufficientStock {
                    product_id: product.id,
                    name: product.name,
                    available: product.stock,
                    requested: line.quantity,
                });
            }
            let unit_price = product.price;
            validated.push(ValidatedLine {
                product,
                quantity: line.quantity,
                unit_price,
            });
        }

        // Deduct stock in line order, before the order row exists.
        let mut deducted: Vec<(ProductId, u32)> = Vec::with_capacity(validated.len());
        for line in &validated {
            match self
                .ledger
                .adjust_stock(line.product.id, -i64::from(line.quantity))
                .await
            {
                Ok(_) => deducted.push((line.product.id, line.quantity)),
                Err(e) => {
                    let compensation = self.unwind_stock(&deducted, 1).await;
                    return Err(OrderError::CreationFailed {
                        reason: e.to_string(),
                        compensation,
                    });
                }
            }
        }

        let total_amount: Money = validated
            .iter()
            .map(|l| l.unit_price.multiply(l.quantity))
            .sum();

        // Insert the order header; restore stock if it fails.
        let order = match self
            .store
            .insert_order(NewOrder {
                customer_id,
                total_amount,
                status: OrderStatus::Placed,
            })
            .await
        {
            Ok(order) => order,
            Err(e) => {
                let compensation = self.unwind_stock(&deducted, 1).await;
                return Err(OrderError::CreationFailed {
                    reason: e.to_string(),
                    compensation,
                });
            }
        };

        // Insert line items in order; restore stock if one fails. The
        // order header stays behind, as the protocol only compensates
        // stock.
        let mut items = Vec::with_capacity(validated.len());
        for line in &validated {
            match self
                .store
                .insert_order_item(NewOrderItem {
                    order_id: order.id,
                    product_id: line.product.id,
                    quantity: line.quantity,
                    price: line.unit_price,
                })
                .await
            {
                Ok(item) => items.push(OrderItemDetails {
                    item,
                    product: Some(line.product.clone()),
                }),
                Err(e) => {
                    let compensation = self.unwind_stock(&deducted, 1).await;
                    return Err(OrderError::CreationFailed {
                        reason: e.to_string(),
                        compensation,
                    });
                }
            }
        }

        // A PENDING payment is attempted but not required.
        let payment = match self
            .payments
            .create_pending_payment(order.id, order.total_amount)
            .await
        {
            Ok(payment) => Some(payment),
            Err(e) => {
                tracing::warn!(
                    order_id = %order.id,
                    error = %e,
                    "failed to create pending payment; returning order without one"
                );
                None
            }
        };

        metrics::counter!("orders_created_total").increment(1);
        metrics::histogram!("order_create_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        Ok(OrderDetails {
            order,
            customer: Some(customer),
            items,
            payment,
        })
    }

    /// Cancels a PLACED order: restores stock for every line item,
    /// flips the status to CANCELLED, then refunds the payment on a
    /// best-effort basis.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(&self, order_id: OrderId) -> Result<OrderDetails, OrderError> {
        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or(OrderError::NotFound(order_id))?;

        match order.status {
            OrderStatus::Cancelled => return Err(OrderError::AlreadyCancelled),
            OrderStatus::Completed => return Err(OrderError::NotCancellable(order.status)),
            OrderStatus::Placed => {}
        }

        let items = self.store.list_order_items(order_id).await?;

        // Restore stock first; re-deduct what was restored on failure.
        let mut restored: Vec<(ProductId, u32)> = Vec::with_capacity(items.len());
        for item in &items {
            match self
                .ledger
                .adjust_stock(item.product_id, i64::from(item.quantity))
                .await
            {
                Ok(_) => restored.push((item.product_id, item.quantity)),
                Err(e) => {
                    let compensation = self.unwind_stock(&restored, -1).await;
                    return Err(OrderError::CancellationFailed {
                        reason: e.to_string(),
                        compensation,
                    });
                }
            }
        }

        // Flip the status; re-deduct the restored stock if that fails.
        match self
            .store
            .update_order_status(order_id, OrderStatus::Cancelled)
            .await
        {
            Ok(Some(_)) => {}
            outcome => {
                let reason = match outcome {
                    Err(e) => e.to_string(),
                    _ => "failed to update order status".to_string(),
                };
                let compensation = self.unwind_stock(&restored, -1).await;
                return Err(OrderError::CancellationFailed {
                    reason,
                    compensation,
                });
            }
        }

        // Refund is best-effort: cancellation stands even if it fails.
        if let Err(e) = self.payments.refund_payment_by_order(order_id).await {
            tracing::warn!(
                %order_id,
                error = %e,
                "failed to refund payment after cancellation"
            );
        }

        metrics::counter!("orders_cancelled_total").increment(1);
        self.get_order_details(order_id).await
    }

    /// Marks an order COMPLETED.
    ///
    /// With a payment method, delegates to payment processing (which
    /// completes the order as a side effect). Without one, flips the
    /// status directly. That second form is the legacy path kept for
    /// compatibility: it bypasses the payment lifecycle entirely and
    /// can leave the payment PENDING forever.
    #[tracing::instrument(skip(self))]
    pub async fn complete_order(
        &self,
        order_id: OrderId,
        method: Option<PaymentMethod>,
    ) -> Result<OrderDetails, OrderError> {
        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or(OrderError::NotFound(order_id))?;

        match order.status {
            OrderStatus::Completed => return Err(OrderError::AlreadyCompleted),
            OrderStatus::Cancelled => return Err(OrderError::CompleteCancelled),
            OrderStatus::Placed => {}
        }

        match method {
            Some(method) => {
                self.payments
                    .process_payment_by_order(order_id, method)
                    .await?;
            }
            None => {
                match self
                    .store
                    .update_order_status(order_id, OrderStatus::Completed)
                    .await?
                {
                    Some(_) => {}
                    None => return Err(OrderError::StatusUpdateFailed),
                }
            }
        }

        metrics::counter!("orders_completed_total").increment(1);
        self.get_order_details(order_id).await
    }

    /// Processes payment for an order and returns the completed order
    /// with the processed payment attached.
    #[tracing::instrument(skip(self))]
    pub async fn process_order_payment(
        &self,
        order_id: OrderId,
        method: PaymentMethod,
    ) -> Result<OrderDetails, OrderError> {
        self.payments
            .process_payment_by_order(order_id, method)
            .await?;
        self.get_order_details(order_id).await
    }

    /// Loads the full composed view of an order.
    #[tracing::instrument(skip(self))]
    pub async fn get_order_details(&self, order_id: OrderId) -> Result<OrderDetails, OrderError> {
        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or(OrderError::NotFound(order_id))?;
        self.assemble_details(order).await
    }

    /// Lists a customer's orders as full composed views.
    #[tracing::instrument(skip(self))]
    pub async fn list_customer_orders(
        &self,
        customer_id: CustomerId,
        limit: usize,
    ) -> Result<Vec<OrderDetails>, OrderError> {
        let orders = self
            .store
            .list_orders(OrderFilter::for_customer(customer_id), limit)
            .await?;

        let mut details = Vec::with_capacity(orders.len());
        for order in orders {
            details.push(self.assemble_details(order).await?);
        }
        Ok(details)
    }

    async fn assemble_details(&self, order: Order) -> Result<OrderDetails, OrderError> {
        let customer = self.store.get_customer(order.customer_id).await?;
        let payment = self.store.get_payment_by_order(order.id).await?;

        let items = self.store.list_order_items(order.id).await?;
        let mut item_details = Vec::with_capacity(items.len());
        for item in items {
            let product = self.store.get_product(item.product_id).await?;
            item_details.push(OrderItemDetails { item, product });
        }

        Ok(OrderDetails {
            order,
            customer,
            items: item_details,
            payment,
        })
    }

    /// Re-applies stock adjustments for already-adjusted lines, in
    /// reverse order. `sign` is +1 to give stock back (create path) or
    /// -1 to take it back out (cancel path). Step failures are logged
    /// and reported, never raised.
    async fn unwind_stock(
        &self,
        applied: &[(ProductId, u32)],
        sign: i64,
    ) -> CompensationReport {
        metrics::counter!("order_compensations_total").increment(1);
        let mut report = CompensationReport::new();
        for (product_id, quantity) in applied.iter().rev() {
            match self
                .ledger
                .adjust_stock(*product_id, sign * i64::from(*quantity))
                .await
            {
                Ok(_) => report.record_success(),
                Err(e) => {
                    tracing::warn!(
                        %product_id,
                        error = %e,
                        "stock compensation step failed"
                    );
                    report.record_failure(
                        format!("restore stock for product {product_id}"),
                        e,
                    );
                }
            }
        }
        report
    }
}
