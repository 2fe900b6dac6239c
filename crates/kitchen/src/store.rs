//! Projection store port and in-memory adapter.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::OrderId;
use tokio::sync::RwLock;

use crate::error::{KitchenError, Result};
use crate::projection::KitchenOrder;

/// Keyed store for kitchen projections.
#[async_trait]
pub trait KitchenOrderStore: Send + Sync {
    async fn find_by_id(&self, order_id: OrderId) -> Result<Option<KitchenOrder>>;

    /// Returns every projection matching `predicate`, oldest first.
    async fn find_by_predicate(
        &self,
        predicate: &(dyn for<'a> Fn(&'a KitchenOrder) -> bool + Send + Sync),
    ) -> Result<Vec<KitchenOrder>>;

    async fn save(&self, order: &KitchenOrder) -> Result<()>;
}

/// In-memory kitchen store for testing and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryKitchenStore {
    orders: Arc<RwLock<HashMap<OrderId, KitchenOrder>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryKitchenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every operation fail until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(KitchenError::Store("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl KitchenOrderStore for InMemoryKitchenStore {
    async fn find_by_id(&self, order_id: OrderId) -> Result<Option<KitchenOrder>> {
        self.check_available()?;
        Ok(self.orders.read().await.get(&order_id).cloned())
    }

    async fn find_by_predicate(
        &self,
        predicate: &(dyn for<'a> Fn(&'a KitchenOrder) -> bool + Send + Sync),
    ) -> Result<Vec<KitchenOrder>> {
        self.check_available()?;
        let mut found: Vec<_> = self
            .orders
            .read()
            .await
            .values()
            .filter(|order| predicate(order))
            .cloned()
            .collect();
        found.sort_by_key(|order| (order.created_at, order.order_id));
        Ok(found)
    }

    async fn save(&self, order: &KitchenOrder) -> Result<()> {
        self.check_available()?;
        self.orders
            .write()
            .await
            .insert(order.order_id, order.clone());
        Ok(())
    }
}
