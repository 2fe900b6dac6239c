//! Order persistence port and in-memory adapter.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::OrderId;
use tokio::sync::RwLock;

use crate::error::RepositoryError;
use crate::order::Order;

/// Keyed store for orders.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Loads an order, deleted or not.
    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// Returns every order matching `predicate`, oldest first.
    async fn find_by_predicate(
        &self,
        predicate: &(dyn for<'a> Fn(&'a Order) -> bool + Send + Sync),
    ) -> Result<Vec<Order>, RepositoryError>;

    /// Inserts or replaces an order.
    async fn save(&self, order: &Order) -> Result<(), RepositoryError>;
}

/// In-memory order repository for testing and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderRepository {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
    fail_on_save: Arc<AtomicBool>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures every save to fail.
    pub fn set_fail_on_save(&self, fail: bool) {
        self.fail_on_save.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of stored orders, deleted ones included.
    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn find_by_predicate(
        &self,
        predicate: &(dyn for<'a> Fn(&'a Order) -> bool + Send + Sync),
    ) -> Result<Vec<Order>, RepositoryError> {
        let mut found: Vec<Order> = self
            .orders
            .read()
            .await
            .values()
            .filter(|order| predicate(order))
            .cloned()
            .collect();
        found.sort_by_key(|order| (order.created_at(), order.id()));
        Ok(found)
    }

    async fn save(&self, order: &Order) -> Result<(), RepositoryError> {
        if self.fail_on_save.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable(
                "simulated write failure".to_string(),
            ));
        }
        self.orders.write().await.insert(order.id(), order.clone());
        Ok(())
    }
}
