//! Read-only product lookup used for validation and event enrichment.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::{Money, ProductId};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::RepositoryError;

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub active: bool,
}

impl Product {
    /// Creates an active product.
    pub fn new(id: ProductId, name: impl Into<String>, price: Money) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            active: true,
        }
    }

    /// Marks the product as no longer orderable.
    pub fn deactivated(mut self) -> Self {
        self.active = false;
        self
    }
}

/// Trait for product catalog lookups.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Returns the products that exist among `ids`. Unknown ids are skipped.
    async fn find_all_by_id(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError>;

    /// Returns the orderable menu: active products, ascending by id.
    async fn find_active(&self) -> Result<Vec<Product>, RepositoryError>;
}

/// In-memory product catalog for testing and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProductCatalog {
    products: Arc<RwLock<HashMap<ProductId, Product>>>,
    fail_on_read: Arc<AtomicBool>,
}

impl InMemoryProductCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog holding `products`.
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let products = products.into_iter().map(|p| (p.id, p)).collect();
        Self {
            products: Arc::new(RwLock::new(products)),
            fail_on_read: Arc::default(),
        }
    }

    /// Adds or replaces a product.
    pub async fn insert(&self, product: Product) {
        self.products.write().await.insert(product.id, product);
    }

    /// Configures every lookup to fail.
    pub fn set_fail_on_read(&self, fail: bool) {
        self.fail_on_read.store(fail, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), RepositoryError> {
        if self.fail_on_read.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable(
                "catalog offline".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ProductCatalog for InMemoryProductCatalog {
    async fn find_all_by_id(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        self.check_available()?;
        let products = self.products.read().await;
        Ok(ids.iter().filter_map(|id| products.get(id).cloned()).collect())
    }

    async fn find_active(&self) -> Result<Vec<Product>, RepositoryError> {
        self.check_available()?;
        let mut active: Vec<_> = self
            .products
            .read()
            .await
            .values()
            .filter(|p| p.active)
            .cloned()
            .collect();
        active.sort_by_key(|p| p.id);
        Ok(active)
    }
}
