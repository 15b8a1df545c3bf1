//! Inventory ledger: clamped stock adjustments, serialized per product.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use common::ProductId;
use record_store::{Product, ProductPatch, RecordStore};

use crate::error::LedgerError;

/// Adjusts product stock through read-then-write against the store.
///
/// The store cannot adjust stock in a single statement, so an
/// adjustment is two round trips (read, then write of the clamped
/// value). To keep concurrent adjustments of the same product from
/// losing updates, the ledger holds one async mutex per product and
/// performs the read-modify-write under it. This closes the race
/// within a process only: two backend instances sharing one store can
/// still interleave, which stays open until the store grows an atomic
/// single-statement increment.
pub struct InventoryLedger<S> {
    store: S,
    locks: Mutex<HashMap<ProductId, Arc<tokio::sync::Mutex<()>>>>,
}

impl<S: RecordStore> InventoryLedger<S> {
    /// Creates a ledger over the given store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn lock_for(&self, product_id: ProductId) -> Arc<tokio::sync::Mutex<()>> {
        self.locks
            .lock()
            .unwrap()
            .entry(product_id)
            .or_default()
            .clone()
    }

    /// Adjusts a product's stock by `delta`, clamping the result at
    /// zero, and returns the updated product.
    ///
    /// The clamp means a decrement below zero is silently truncated
    /// rather than rejected, so a decrement followed by an
    /// equal-magnitude increment is only guaranteed to round-trip when
    /// no other adjustment lands in between.
    #[tracing::instrument(skip(self))]
    pub async fn adjust_stock(
        &self,
        product_id: ProductId,
        delta: i64,
    ) -> Result<Product, LedgerError> {
        let lock = self.lock_for(product_id);
        let _guard = lock.lock().await;

        let product = self
            .store
            .get_product(product_id)
            .await?
            .ok_or(LedgerError::ProductMissing(product_id))?;

        let new_stock = (product.stock + delta).max(0);
        metrics::counter!("stock_adjustments_total").increment(1);

        self.store
            .update_product(product_id, ProductPatch::stock(new_stock))
            .await?
            .ok_or(LedgerError::ProductMissing(product_id))
    }
}
