//! Product and customer administration.
//!
//! Thin validation over the store: uniqueness pre-checks plus
//! non-negative price/stock guards. Listing and lookups pass straight
//! through.

use common::{CustomerId, ProductId};
use record_store::{
    Customer, NewCustomer, NewProduct, Product, ProductFilter, ProductPatch, RecordStore,
    RecordStoreError,
};

use crate::error::CatalogError;

/// Service for managing the product catalog and customer records.
#[derive(Clone)]
pub struct CatalogService<S> {
    store: S,
}

impl<S: RecordStore> CatalogService<S> {
    /// Creates a new catalog service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Adds a product after validating price, stock, and SKU
    /// uniqueness.
    #[tracing::instrument(skip(self, new), fields(sku = %new.sku))]
    pub async fn add_product(&self, new: NewProduct) -> Result<Product, CatalogError> {
        if new.price.is_negative() {
            return Err(CatalogError::NegativePrice);
        }
        if new.stock < 0 {
            return Err(CatalogError::NegativeStock);
        }
        if self.store.get_product_by_sku(&new.sku).await?.is_some() {
            return Err(CatalogError::DuplicateSku(new.sku));
        }

        // The store's unique index backstops the pre-check under
        // concurrent inserts.
        self.store.insert_product(new).await.map_err(|e| match e {
            RecordStoreError::Conflict { value, .. } => CatalogError::DuplicateSku(value),
            other => CatalogError::Store(other),
        })
    }

    /// Fetches a product by id.
    pub async fn get_product(&self, id: ProductId) -> Result<Option<Product>, CatalogError> {
        Ok(self.store.get_product(id).await?)
    }

    /// Fetches a product by SKU.
    pub async fn get_product_by_sku(&self, sku: &str) -> Result<Option<Product>, CatalogError> {
        Ok(self.store.get_product_by_sku(sku).await?)
    }

    /// Applies an admin edit to a product.
    pub async fn update_product(
        &self,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Option<Product>, CatalogError> {
        if patch.price.is_some_and(|p| p.is_negative()) {
            return Err(CatalogError::NegativePrice);
        }
        if patch.stock.is_some_and(|s| s < 0) {
            return Err(CatalogError::NegativeStock);
        }
        Ok(self.store.update_product(id, patch).await?)
    }

    /// Lists products, optionally filtered by category.
    pub async fn list_products(
        &self,
        filter: ProductFilter,
        limit: usize,
    ) -> Result<Vec<Product>, CatalogError> {
        Ok(self.store.list_products(filter, limit).await?)
    }

    /// Adds a customer after checking email uniqueness.
    #[tracing::instrument(skip(self, new), fields(email = %new.email))]
    pub async fn add_customer(&self, new: NewCustomer) -> Result<Customer, CatalogError> {
        if self
            .store
            .get_customer_by_email(&new.email)
            .await?
            .is_some()
        {
            return Err(CatalogError::DuplicateEmail(new.email));
        }

        self.store.insert_customer(new).await.map_err(|e| match e {
            RecordStoreError::Conflict { value, .. } => CatalogError::DuplicateEmail(value),
            other => CatalogError::Store(other),
        })
    }

    /// Fetches a customer by id.
    pub async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>, CatalogError> {
        Ok(self.store.get_customer(id).await?)
    }

    /// Lists customers.
    pub async fn list_customers(&self, limit: usize) -> Result<Vec<Customer>, CatalogError> {
        Ok(self.store.list_customers(limit).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Money;
    use record_store::InMemoryRecordStore;

    fn widget() -> NewProduct {
        NewProduct {
            sku: "SKU-001".to_string(),
            name: "Widget".to_string(),
            price: Money::from_cents(500),
            stock: 10,
            category: Some("tools".to_string()),
        }
    }

    #[tokio::test]
    async fn add_product_rejects_duplicate_sku() {
        let store = InMemoryRecordStore::new();
        let catalog = CatalogService::new(store);

        catalog.add_product(widget()).await.unwrap();
        let err = catalog.add_product(widget()).await.unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateSku(sku) if sku == "SKU-001"));
    }

    #[tokio::test]
    async fn add_product_rejects_negative_values() {
        let store = InMemoryRecordStore::new();
        let catalog = CatalogService::new(store);

        let err = catalog
            .add_product(NewProduct {
                price: Money::from_cents(-1),
                ..widget()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NegativePrice));

        let err = catalog
            .add_product(NewProduct {
                stock: -1,
                ..widget()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NegativeStock));
    }

    #[tokio::test]
    async fn update_product_guards_negative_price() {
        let store = InMemoryRecordStore::new();
        let catalog = CatalogService::new(store);
        let product = catalog.add_product(widget()).await.unwrap();

        let err = catalog
            .update_product(
                product.id,
                ProductPatch {
                    price: Some(Money::from_cents(-100)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NegativePrice));
    }

    #[tokio::test]
    async fn add_customer_rejects_duplicate_email() {
        let store = InMemoryRecordStore::new();
        let catalog = CatalogService::new(store);

        let new = NewCustomer {
            name: "Jane".to_string(),
            email: "jane@example.com".to_string(),
            phone: "555-0100".to_string(),
            city: None,
        };
        catalog.add_customer(new.clone()).await.unwrap();
        let err = catalog.add_customer(new).await.unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateEmail(email) if email == "jane@example.com"));
    }

    #[tokio::test]
    async fn lookups_and_listings_pass_through() {
        let store = InMemoryRecordStore::new();
        let catalog = CatalogService::new(store);
        let product = catalog.add_product(widget()).await.unwrap();

        assert_eq!(
            catalog.get_product(product.id).await.unwrap().unwrap().id,
            product.id
        );
        assert_eq!(
            catalog
                .get_product_by_sku("SKU-001")
                .await
                .unwrap()
                .unwrap()
                .id,
            product.id
        );
        assert_eq!(
            catalog
                .list_products(ProductFilter::default(), 100)
                .await
                .unwrap()
                .len(),
            1
        );
    }
}
