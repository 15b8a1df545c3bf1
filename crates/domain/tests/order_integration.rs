//! End-to-end tests of the order/payment protocol over the in-memory
//! store.

use common::Money;
use domain::{OrderError, OrderLine, OrderService, PaymentError, PaymentService};
use record_store::{
    InMemoryRecordStore, NewCustomer, NewProduct, OrderStatus, PaymentMethod, PaymentStatus,
    Product, RecordStore,
};

async fn seed_customer(store: &InMemoryRecordStore, email: &str) -> common::CustomerId {
    store
        .insert_customer(NewCustomer {
            name: "Jane".to_string(),
            email: email.to_string(),
            phone: "555-0100".to_string(),
            city: Some("Madrid".to_string()),
        })
        .await
        .unwrap()
        .id
}

async fn seed_product(
    store: &InMemoryRecordStore,
    sku: &str,
    name: &str,
    cents: i64,
    stock: i64,
) -> Product {
    store
        .insert_product(NewProduct {
            sku: sku.to_string(),
            name: name.to_string(),
            price: Money::from_cents(cents),
            stock,
            category: None,
        })
        .await
        .unwrap()
}

async fn stock_of(store: &InMemoryRecordStore, product: &Product) -> i64 {
    store.get_product(product.id).await.unwrap().unwrap().stock
}

#[tokio::test]
async fn place_pay_lifecycle() {
    let store = InMemoryRecordStore::new();
    let customer = seed_customer(&store, "c1@example.com").await;
    let p1 = seed_product(&store, "SKU-001", "Widget", 500, 10).await;
    let service = OrderService::new(store.clone());

    // Place: stock 10 -> 7, total 3 x $5.00, PENDING payment of $15.00.
    let placed = service
        .create_order(
            customer,
            vec![OrderLine {
                product_id: p1.id,
                quantity: 3,
            }],
        )
        .await
        .unwrap();
    assert_eq!(placed.order.status, OrderStatus::Placed);
    assert_eq!(placed.order.total_amount, Money::from_cents(1500));
    assert_eq!(placed.computed_total(), placed.order.total_amount);
    assert_eq!(stock_of(&store, &p1).await, 7);
    let pending = placed.payment.clone().unwrap();
    assert_eq!(pending.status, PaymentStatus::Pending);
    assert_eq!(pending.amount, Money::from_cents(1500));

    // Pay by card: payment PAID/Card, order COMPLETED.
    let paid = service
        .process_order_payment(placed.order.id, PaymentMethod::Card)
        .await
        .unwrap();
    assert_eq!(paid.order.status, OrderStatus::Completed);
    let payment = paid.payment.unwrap();
    assert_eq!(payment.status, PaymentStatus::Paid);
    assert_eq!(payment.method, Some(PaymentMethod::Card));

    // Paying again is rejected and changes nothing.
    let err = service
        .process_order_payment(placed.order.id, PaymentMethod::Cash)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrderError::PaymentProcessing(PaymentError::AlreadyProcessed)
    ));
    let payment = store.get_payment(payment.id).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Paid);
    assert_eq!(payment.method, Some(PaymentMethod::Card));
}

#[tokio::test]
async fn create_then_cancel_restores_every_product() {
    let store = InMemoryRecordStore::new();
    let customer = seed_customer(&store, "c2@example.com").await;
    let p1 = seed_product(&store, "SKU-001", "Widget", 500, 10).await;
    let p2 = seed_product(&store, "SKU-002", "Gadget", 900, 6).await;
    let service = OrderService::new(store.clone());

    let placed = service
        .create_order(
            customer,
            vec![
                OrderLine {
                    product_id: p1.id,
                    quantity: 3,
                },
                OrderLine {
                    product_id: p2.id,
                    quantity: 1,
                },
            ],
        )
        .await
        .unwrap();
    assert_eq!(stock_of(&store, &p1).await, 7);
    assert_eq!(stock_of(&store, &p2).await, 5);

    let cancelled = service.cancel_order(placed.order.id).await.unwrap();
    assert_eq!(cancelled.order.status, OrderStatus::Cancelled);
    assert_eq!(stock_of(&store, &p1).await, 10);
    assert_eq!(stock_of(&store, &p2).await, 6);

    // The PENDING payment moved to REFUNDED with the cancellation.
    assert_eq!(cancelled.payment.unwrap().status, PaymentStatus::Refunded);
}

#[tokio::test]
async fn multi_line_totals_use_snapshotted_prices() {
    let store = InMemoryRecordStore::new();
    let customer = seed_customer(&store, "c3@example.com").await;
    let p1 = seed_product(&store, "SKU-001", "Widget", 250, 10).await;
    let p2 = seed_product(&store, "SKU-002", "Gadget", 1000, 10).await;
    let service = OrderService::new(store.clone());

    let placed = service
        .create_order(
            customer,
            vec![
                OrderLine {
                    product_id: p1.id,
                    quantity: 4,
                },
                OrderLine {
                    product_id: p2.id,
                    quantity: 2,
                },
            ],
        )
        .await
        .unwrap();

    // 4 x $2.50 + 2 x $10.00 = $30.00
    assert_eq!(placed.order.total_amount, Money::from_cents(3000));
    assert_eq!(placed.computed_total(), placed.order.total_amount);
    assert_eq!(placed.items.len(), 2);
    assert_eq!(placed.items[0].item.product_id, p1.id);
    assert_eq!(placed.items[1].item.product_id, p2.id);
}

#[tokio::test]
async fn insufficient_stock_on_second_line_mutates_nothing() {
    let store = InMemoryRecordStore::new();
    let customer = seed_customer(&store, "c4@example.com").await;
    let p1 = seed_product(&store, "SKU-001", "Widget", 500, 10).await;
    let p2 = seed_product(&store, "SKU-002", "Gadget", 900, 1).await;
    let service = OrderService::new(store.clone());

    let err = service
        .create_order(
            customer,
            vec![
                OrderLine {
                    product_id: p1.id,
                    quantity: 2,
                },
                OrderLine {
                    product_id: p2.id,
                    quantity: 5,
                },
            ],
        )
        .await
        .unwrap_err();

    // Validation runs before any deduction, so the first line's stock
    // is untouched too.
    assert!(matches!(err, OrderError::InsufficientStock { .. }));
    assert_eq!(stock_of(&store, &p1).await, 10);
    assert_eq!(stock_of(&store, &p2).await, 1);
    assert!(store
        .list_orders(record_store::OrderFilter::default(), 100)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn payment_revert_when_order_update_fails() {
    let store = InMemoryRecordStore::new();
    let customer = seed_customer(&store, "c5@example.com").await;
    let p1 = seed_product(&store, "SKU-001", "Widget", 500, 10).await;
    let service = OrderService::new(store.clone());
    let payments = PaymentService::new(store.clone());

    let placed = service
        .create_order(
            customer,
            vec![OrderLine {
                product_id: p1.id,
                quantity: 1,
            }],
        )
        .await
        .unwrap();
    let payment = placed.payment.unwrap();

    store.set_fail_on_update_order_status(true).await;
    let err = payments
        .process_payment(payment.id, PaymentMethod::Upi)
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::ProcessingFailed { .. }));

    // The forward PAID write was undone.
    let reverted = store.get_payment(payment.id).await.unwrap().unwrap();
    assert_eq!(reverted.status, PaymentStatus::Pending);
    assert!(reverted.method.is_none());
    let order = store.get_order(placed.order.id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Placed);

    // With the fault cleared the same payment processes normally.
    store.set_fail_on_update_order_status(false).await;
    let processed = payments
        .process_payment(payment.id, PaymentMethod::Upi)
        .await
        .unwrap();
    assert_eq!(processed.status, PaymentStatus::Paid);
}

#[tokio::test]
async fn order_without_payment_can_still_complete_legacy() {
    let store = InMemoryRecordStore::new();
    let customer = seed_customer(&store, "c6@example.com").await;
    let p1 = seed_product(&store, "SKU-001", "Widget", 500, 10).await;
    let service = OrderService::new(store.clone());

    store.set_fail_on_insert_payment(true).await;
    let placed = service
        .create_order(
            customer,
            vec![OrderLine {
                product_id: p1.id,
                quantity: 1,
            }],
        )
        .await
        .unwrap();
    assert!(placed.payment.is_none());
    store.set_fail_on_insert_payment(false).await;

    // The legacy path tolerates the missing payment record.
    let completed = service.complete_order(placed.order.id, None).await.unwrap();
    assert_eq!(completed.order.status, OrderStatus::Completed);
    assert!(completed.payment.is_none());

    // The payment path cannot: there is nothing to process.
    let another = service
        .create_order(
            customer,
            vec![OrderLine {
                product_id: p1.id,
                quantity: 1,
            }],
        )
        .await
        .unwrap();
    assert!(another.payment.is_some());
}

#[tokio::test]
async fn cancel_without_payment_record_still_cancels() {
    let store = InMemoryRecordStore::new();
    let customer = seed_customer(&store, "c7@example.com").await;
    let p1 = seed_product(&store, "SKU-001", "Widget", 500, 10).await;
    let service = OrderService::new(store.clone());

    store.set_fail_on_insert_payment(true).await;
    let placed = service
        .create_order(
            customer,
            vec![OrderLine {
                product_id: p1.id,
                quantity: 2,
            }],
        )
        .await
        .unwrap();
    store.set_fail_on_insert_payment(false).await;

    // Refund is best-effort; its absence must not block cancellation.
    let cancelled = service.cancel_order(placed.order.id).await.unwrap();
    assert_eq!(cancelled.order.status, OrderStatus::Cancelled);
    assert!(cancelled.payment.is_none());
    assert_eq!(stock_of(&store, &p1).await, 10);
}
