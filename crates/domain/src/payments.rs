//! Payment lifecycle manager.
//!
//! Owns the PENDING → PAID → REFUNDED transitions and their coupling
//! to order status. Processing a payment is a two-step protocol over
//! independent store calls (mark payment PAID, then complete the
//! order); when the second step fails the first is reverted, following
//! the same forward/undo pattern the order flows use for stock.

use common::{Money, OrderId, PaymentId};
use record_store::{
    NewPayment, OrderStatus, Payment, PaymentMethod, PaymentStatus, RecordStore,
};

use crate::compensation::CompensationReport;
use crate::error::PaymentError;
use crate::views::PaymentDetails;

/// Service for managing payments.
#[derive(Clone)]
pub struct PaymentService<S> {
    store: S,
}

impl<S: RecordStore> PaymentService<S> {
    /// Creates a new payment service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Inserts a PENDING payment for an order, typically at order
    /// creation time. The amount equals the order total.
    #[tracing::instrument(skip(self))]
    pub async fn create_pending_payment(
        &self,
        order_id: OrderId,
        amount: Money,
    ) -> Result<Payment, PaymentError> {
        self.store
            .insert_payment(NewPayment {
                order_id,
                amount,
                status: PaymentStatus::Pending,
            })
            .await
            .map_err(|e| PaymentError::CreationFailed(e.to_string()))
    }

    /// Marks a payment PAID with the given method and completes its
    /// order.
    ///
    /// If the order-status update fails, the payment is reverted to
    /// PENDING with no method and the call fails with the original
    /// cause; the revert's own outcome rides on the error.
    #[tracing::instrument(skip(self))]
    pub async fn process_payment(
        &self,
        payment_id: PaymentId,
        method: PaymentMethod,
    ) -> Result<Payment, PaymentError> {
        let payment = self
            .store
            .get_payment(payment_id)
            .await?
            .ok_or(PaymentError::NotFound(payment_id))?;

        match payment.status {
            PaymentStatus::Paid => return Err(PaymentError::AlreadyProcessed),
            PaymentStatus::Refunded => return Err(PaymentError::ProcessRefunded),
            PaymentStatus::Pending => {}
        }

        // Forward action: flip the payment to PAID.
        let processed = self
            .store
            .update_payment_state(payment_id, PaymentStatus::Paid, Some(method))
            .await
            .map_err(|e| PaymentError::ProcessingFailed {
                reason: e.to_string(),
                compensation: CompensationReport::new(),
            })?
            .ok_or_else(|| PaymentError::ProcessingFailed {
                reason: "payment row is missing".to_string(),
                compensation: CompensationReport::new(),
            })?;

        // Dependent action: complete the order. Revert on failure.
        let order_update = self
            .store
            .update_order_status(payment.order_id, OrderStatus::Completed)
            .await;

        match order_update {
            Ok(Some(_)) => {
                metrics::counter!("payments_processed_total").increment(1);
                Ok(processed)
            }
            outcome => {
                let reason = match outcome {
                    Err(e) => e.to_string(),
                    _ => "failed to update order status".to_string(),
                };
                let compensation = self.revert_to_pending(payment_id).await;
                Err(PaymentError::ProcessingFailed {
                    reason,
                    compensation,
                })
            }
        }
    }

    /// Undoes a PAID flip after the dependent order update failed.
    async fn revert_to_pending(&self, payment_id: PaymentId) -> CompensationReport {
        let mut report = CompensationReport::new();
        match self
            .store
            .update_payment_state(payment_id, PaymentStatus::Pending, None)
            .await
        {
            Ok(Some(_)) => report.record_success(),
            Ok(None) => {
                tracing::warn!(%payment_id, "payment vanished while reverting to PENDING");
                report.record_failure("revert payment to pending", "payment row is missing");
            }
            Err(e) => {
                tracing::warn!(%payment_id, error = %e, "failed to revert payment to PENDING");
                report.record_failure("revert payment to pending", e);
            }
        }
        report
    }

    /// Resolves the payment for an order and processes it.
    #[tracing::instrument(skip(self))]
    pub async fn process_payment_by_order(
        &self,
        order_id: OrderId,
        method: PaymentMethod,
    ) -> Result<Payment, PaymentError> {
        let payment = self
            .store
            .get_payment_by_order(order_id)
            .await?
            .ok_or(PaymentError::NotFoundForOrder(order_id))?;
        self.process_payment(payment.id, method).await
    }

    /// Marks a payment REFUNDED, preserving any recorded method.
    ///
    /// Typically called when an order is cancelled. Refunding never
    /// touches the order status: a refund does not re-open a cancelled
    /// order.
    #[tracing::instrument(skip(self))]
    pub async fn refund_payment(&self, payment_id: PaymentId) -> Result<Payment, PaymentError> {
        let payment = self
            .store
            .get_payment(payment_id)
            .await?
            .ok_or(PaymentError::NotFound(payment_id))?;

        if payment.status == PaymentStatus::Refunded {
            return Err(PaymentError::AlreadyRefunded);
        }

        let refunded = self
            .store
            .update_payment_state(payment_id, PaymentStatus::Refunded, payment.method)
            .await
            .map_err(|e| PaymentError::RefundFailed(e.to_string()))?
            .ok_or_else(|| PaymentError::RefundFailed("payment row is missing".to_string()))?;

        metrics::counter!("payments_refunded_total").increment(1);
        Ok(refunded)
    }

    /// Resolves the payment for an order and refunds it.
    #[tracing::instrument(skip(self))]
    pub async fn refund_payment_by_order(
        &self,
        order_id: OrderId,
    ) -> Result<Payment, PaymentError> {
        let payment = self
            .store
            .get_payment_by_order(order_id)
            .await?
            .ok_or(PaymentError::NotFoundForOrder(order_id))?;
        self.refund_payment(payment.id).await
    }

    /// Loads a payment with its order attached. Read-only.
    #[tracing::instrument(skip(self))]
    pub async fn get_payment_details(
        &self,
        payment_id: PaymentId,
    ) -> Result<PaymentDetails, PaymentError> {
        let payment = self
            .store
            .get_payment(payment_id)
            .await?
            .ok_or(PaymentError::NotFound(payment_id))?;
        let order = self.store.get_order(payment.order_id).await?;
        Ok(PaymentDetails { payment, order })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use record_store::{InMemoryRecordStore, NewCustomer, NewOrder, Order};

    async fn seed_order(store: &InMemoryRecordStore, cents: i64) -> Order {
        let customer = store
            .insert_customer(NewCustomer {
                name: "Jane".to_string(),
                email: format!("jane+{}@example.com", uuid::Uuid::new_v4()),
                phone: "555-0100".to_string(),
                city: None,
            })
            .await
            .unwrap();
        store
            .insert_order(NewOrder {
                customer_id: customer.id,
                total_amount: Money::from_cents(cents),
                status: OrderStatus::Placed,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn process_marks_payment_paid_and_order_completed() {
        let store = InMemoryRecordStore::new();
        let order = seed_order(&store, 1500).await;
        let service = PaymentService::new(store.clone());

        let payment = service
            .create_pending_payment(order.id, order.total_amount)
            .await
            .unwrap();
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert!(payment.method.is_none());

        let processed = service
            .process_payment(payment.id, PaymentMethod::Card)
            .await
            .unwrap();
        assert_eq!(processed.status, PaymentStatus::Paid);
        assert_eq!(processed.method, Some(PaymentMethod::Card));

        let order = store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Completed);
    }

    #[tokio::test]
    async fn second_process_fails_and_leaves_status() {
        let store = InMemoryRecordStore::new();
        let order = seed_order(&store, 1000).await;
        let service = PaymentService::new(store.clone());

        let payment = service
            .create_pending_payment(order.id, order.total_amount)
            .await
            .unwrap();
        service
            .process_payment(payment.id, PaymentMethod::Cash)
            .await
            .unwrap();

        let err = service
            .process_payment(payment.id, PaymentMethod::Card)
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::AlreadyProcessed));

        let payment = store.get_payment(payment.id).await.unwrap().unwrap();
        assert_eq!(payment.status, PaymentStatus::Paid);
        assert_eq!(payment.method, Some(PaymentMethod::Cash));
    }

    #[tokio::test]
    async fn refunded_payment_cannot_be_processed() {
        let store = InMemoryRecordStore::new();
        let order = seed_order(&store, 1000).await;
        let service = PaymentService::new(store.clone());

        let payment = service
            .create_pending_payment(order.id, order.total_amount)
            .await
            .unwrap();
        service.refund_payment(payment.id).await.unwrap();

        let err = service
            .process_payment(payment.id, PaymentMethod::Upi)
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::ProcessRefunded));
    }

    #[tokio::test]
    async fn failed_order_update_reverts_payment() {
        let store = InMemoryRecordStore::new();
        let order = seed_order(&store, 2000).await;
        let service = PaymentService::new(store.clone());

        let payment = service
            .create_pending_payment(order.id, order.total_amount)
            .await
            .unwrap();

        store.set_fail_on_update_order_status(true).await;
        let err = service
            .process_payment(payment.id, PaymentMethod::Card)
            .await
            .unwrap_err();

        match err {
            PaymentError::ProcessingFailed { compensation, .. } => {
                assert!(compensation.is_clean());
                assert_eq!(compensation.attempted(), 1);
            }
            other => panic!("unexpected error: {other}"),
        }

        let payment = store.get_payment(payment.id).await.unwrap().unwrap();
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert!(payment.method.is_none());

        let order = store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Placed);
    }

    #[tokio::test]
    async fn failed_revert_is_reported_not_raised() {
        let store = InMemoryRecordStore::new();
        let order = seed_order(&store, 2000).await;
        let service = PaymentService::new(store.clone());

        let payment = service
            .create_pending_payment(order.id, order.total_amount)
            .await
            .unwrap();

        // Let the PAID flip through, fail the order update, and fail
        // the revert that follows it.
        store.set_fail_on_update_order_status(true).await;
        store.fail_payment_updates_after(1).await;

        let err = service
            .process_payment(payment.id, PaymentMethod::Card)
            .await
            .unwrap_err();

        match err {
            PaymentError::ProcessingFailed { compensation, .. } => {
                assert_eq!(compensation.failures().len(), 1);
                assert!(compensation.failures()[0].step.contains("revert"));
            }
            other => panic!("unexpected error: {other}"),
        }

        // The revert failed, so the payment stays PAID while the order
        // stays PLACED: the surfaced report is what makes this state
        // visible to operators.
        let payment = store.get_payment(payment.id).await.unwrap().unwrap();
        assert_eq!(payment.status, PaymentStatus::Paid);
        let order = store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Placed);
    }

    #[tokio::test]
    async fn process_by_order_resolves_payment() {
        let store = InMemoryRecordStore::new();
        let order = seed_order(&store, 1500).await;
        let service = PaymentService::new(store.clone());

        service
            .create_pending_payment(order.id, order.total_amount)
            .await
            .unwrap();

        let processed = service
            .process_payment_by_order(order.id, PaymentMethod::Upi)
            .await
            .unwrap();
        assert_eq!(processed.status, PaymentStatus::Paid);

        let err = service
            .process_payment_by_order(OrderId::new(), PaymentMethod::Upi)
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::NotFoundForOrder(_)));
    }

    #[tokio::test]
    async fn refund_pending_payment_succeeds_once() {
        let store = InMemoryRecordStore::new();
        let order = seed_order(&store, 900).await;
        let service = PaymentService::new(store.clone());

        let payment = service
            .create_pending_payment(order.id, order.total_amount)
            .await
            .unwrap();

        let refunded = service.refund_payment_by_order(order.id).await.unwrap();
        assert_eq!(refunded.status, PaymentStatus::Refunded);

        let err = service.refund_payment(payment.id).await.unwrap_err();
        assert!(matches!(err, PaymentError::AlreadyRefunded));
    }

    #[tokio::test]
    async fn refund_preserves_method_of_paid_payment() {
        let store = InMemoryRecordStore::new();
        let order = seed_order(&store, 900).await;
        let service = PaymentService::new(store.clone());

        let payment = service
            .create_pending_payment(order.id, order.total_amount)
            .await
            .unwrap();
        service
            .process_payment(payment.id, PaymentMethod::Upi)
            .await
            .unwrap();

        let refunded = service.refund_payment(payment.id).await.unwrap();
        assert_eq!(refunded.status, PaymentStatus::Refunded);
        assert_eq!(refunded.method, Some(PaymentMethod::Upi));
    }

    #[tokio::test]
    async fn refund_does_not_reopen_order() {
        let store = InMemoryRecordStore::new();
        let order = seed_order(&store, 900).await;
        let service = PaymentService::new(store.clone());

        let payment = service
            .create_pending_payment(order.id, order.total_amount)
            .await
            .unwrap();
        service
            .process_payment(payment.id, PaymentMethod::Cash)
            .await
            .unwrap();

        service.refund_payment(payment.id).await.unwrap();
        let order = store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Completed);
    }

    #[tokio::test]
    async fn payment_details_embed_order() {
        let store = InMemoryRecordStore::new();
        let order = seed_order(&store, 700).await;
        let service = PaymentService::new(store.clone());

        let payment = service
            .create_pending_payment(order.id, order.total_amount)
            .await
            .unwrap();

        let details = service.get_payment_details(payment.id).await.unwrap();
        assert_eq!(details.payment.id, payment.id);
        assert_eq!(details.order.unwrap().id, order.id);

        let err = service
            .get_payment_details(PaymentId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::NotFound(_)));
    }

    #[tokio::test]
    async fn pending_payment_creation_failure_is_creation_failed() {
        let store = InMemoryRecordStore::new();
        let order = seed_order(&store, 700).await;
        let service = PaymentService::new(store.clone());

        store.set_fail_on_insert_payment(true).await;
        let err = service
            .create_pending_payment(order.id, order.total_amount)
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::CreationFailed(_)));
    }
}
