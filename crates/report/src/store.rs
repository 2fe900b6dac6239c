//! Projection store port and in-memory adapter.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::OrderId;
use tokio::sync::RwLock;

use crate::error::{ReportError, Result};
use crate::projection::ReportOrder;

/// Keyed store for report projections.
#[async_trait]
pub trait ReportOrderStore: Send + Sync {
    async fn find_by_id(&self, order_id: OrderId) -> Result<Option<ReportOrder>>;

    /// Returns every projection matching `predicate`, oldest first.
    async fn find_by_predicate(
        &self,
        predicate: &(dyn for<'a> Fn(&'a ReportOrder) -> bool + Send + Sync),
    ) -> Result<Vec<ReportOrder>>;

    async fn save(&self, order: &ReportOrder) -> Result<()>;

    /// Writes `order` only if no projection exists for its id, atomically.
    /// Returns whether it was written.
    async fn insert_if_absent(&self, order: &ReportOrder) -> Result<bool>;
}

/// In-memory report store for testing and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReportStore {
    orders: Arc<RwLock<HashMap<OrderId, ReportOrder>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryReportStore {
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
            return Err(ReportError::Store("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ReportOrderStore for InMemoryReportStore {
    async fn find_by_id(&self, order_id: OrderId) -> Result<Option<ReportOrder>> {
        self.check_available()?;
        Ok(self.orders.read().await.get(&order_id).cloned())
    }

    async fn find_by_predicate(
        &self,
        predicate: &(dyn for<'a> Fn(&'a ReportOrder) -> bool + Send + Sync),
    ) -> Result<Vec<ReportOrder>> {
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

    async fn save(&self, order: &ReportOrder) -> Result<()> {
        self.check_available()?;
        self.orders
            .write()
            .await
            .insert(order.order_id, order.clone());
        Ok(())
    }

    async fn insert_if_absent(&self, order: &ReportOrder) -> Result<bool> {
        self.check_available()?;
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.order_id) {
            return Ok(false);
        }
        orders.insert(order.order_id, order.clone());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[tokio::test]
    async fn test_insert_if_absent_keeps_existing_row() {
        let store = InMemoryReportStore::new();
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let stub = ReportOrder::ready_stub(OrderId::new(), at, at);

        assert!(store.insert_if_absent(&stub).await.unwrap());

        let mut replacement = stub.clone();
        replacement.table_id = 9;
        assert!(!store.insert_if_absent(&replacement).await.unwrap());
        assert_eq!(store.find_by_id(stub.order_id).await.unwrap(), Some(stub));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_insert_if_absent_fails_when_unavailable() {
        let store = InMemoryReportStore::new();
        store.set_unavailable(true);
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        let err = store
            .insert_if_absent(&ReportOrder::ready_stub(OrderId::new(), at, at))
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::Store(_)));
    }
}
