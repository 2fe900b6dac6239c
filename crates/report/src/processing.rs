//! Idempotent upserts driven by `order.placed` and `order.ready`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::{Clock, OrderId, OrderStatus, TableId};
use event_contract::{OrderPlaced, OrderReady};

use crate::error::{ReportError, Result};
use crate::projection::{ReportItem, ReportOrder};
use crate::store::ReportOrderStore;

/// Command derived from a validated `order.placed` event.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordPlaced {
    pub order_id: OrderId,
    pub table_id: TableId,
    pub created_at: Option<DateTime<Utc>>,
    pub items: Vec<ReportItem>,
}

impl From<OrderPlaced> for RecordPlaced {
    fn from(event: OrderPlaced) -> Self {
        Self {
            order_id: event.order_id,
            table_id: event.table_id,
            created_at: event.created_at,
            items: event.items.into_iter().map(ReportItem::from).collect(),
        }
    }
}

/// Command derived from a validated `order.ready` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordReady {
    pub order_id: OrderId,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<OrderReady> for RecordReady {
    fn from(event: OrderReady) -> Self {
        Self {
            order_id: event.order_id,
            updated_at: event.updated_at,
        }
    }
}

/// What an upsert did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
    /// A projection already existed; nothing was written.
    Skipped,
    /// READY arrived first; a placeholder row was written.
    StubCreated,
}

/// Applies report events to the projection store.
pub struct ReportProcessingService<S> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S: ReportOrderStore> ReportProcessingService<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates the full projection unless one already exists.
    ///
    /// An existing row is never touched, which keeps redelivered events from
    /// double counting. That includes a READY stub: its items stay empty. The
    /// existence check and the write are one store operation, so a stub
    /// written concurrently by the ready listener is never overwritten.
    #[tracing::instrument(skip(self, cmd), fields(order_id = %cmd.order_id, table_id = cmd.table_id))]
    pub async fn record_placed(&self, cmd: RecordPlaced) -> Result<UpsertOutcome> {
        let received_at = self.clock.now();
        let order = ReportOrder {
            order_id: cmd.order_id,
            table_id: cmd.table_id,
            status: OrderStatus::Pending,
            created_at: cmd.created_at.unwrap_or(received_at),
            received_at,
            items: cmd.items,
        };

        if !self.store.insert_if_absent(&order).await? {
            metrics::counter!("report_projection_skips_total").increment(1);
            let stub = self
                .store
                .find_by_id(order.order_id)
                .await?
                .is_some_and(|existing| existing.is_stub());
            if stub {
                tracing::warn!("Placed event arrived after READY stub; items not recorded");
            } else {
                tracing::info!("Order already projected, skipping");
            }
            return Ok(UpsertOutcome::Skipped);
        }

        tracing::info!(items = order.items.len(), "Order projected");
        Ok(UpsertOutcome::Created)
    }

    /// Marks the projection READY, or writes a stub if it does not exist.
    #[tracing::instrument(skip(self, cmd), fields(order_id = %cmd.order_id))]
    pub async fn record_ready(&self, cmd: RecordReady) -> Result<UpsertOutcome> {
        if let Some(order) = self.store.find_by_id(cmd.order_id).await? {
            return self.mark_ready(order).await;
        }

        let now = self.clock.now();
        let stub = ReportOrder::ready_stub(cmd.order_id, cmd.updated_at.unwrap_or(now), now);
        if self.store.insert_if_absent(&stub).await? {
            tracing::warn!("Ready event for unknown order, stub projection created");
            return Ok(UpsertOutcome::StubCreated);
        }

        // The placed listener wrote the row after our lookup.
        match self.store.find_by_id(cmd.order_id).await? {
            Some(order) => self.mark_ready(order).await,
            None => Err(ReportError::Store(format!(
                "projection {} vanished during ready upsert",
                cmd.order_id
            ))),
        }
    }

    async fn mark_ready(&self, mut order: ReportOrder) -> Result<UpsertOutcome> {
        order.status = OrderStatus::Ready;
        self.store.save(&order).await?;
        tracing::info!("Order marked ready");
        Ok(UpsertOutcome::Updated)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use common::{FixedClock, Money, ProductId};

    use super::*;
    use crate::store::InMemoryReportStore;

    /// Answers the first `stale_reads` lookups with `None`, as if the other
    /// listener's write landed right after the read.
    struct StaleReadStore {
        inner: InMemoryReportStore,
        stale_reads: AtomicUsize,
    }

    impl StaleReadStore {
        fn new(inner: InMemoryReportStore, stale_reads: usize) -> Self {
            Self {
                inner,
                stale_reads: AtomicUsize::new(stale_reads),
            }
        }
    }

    #[async_trait]
    impl ReportOrderStore for StaleReadStore {
        async fn find_by_id(&self, order_id: OrderId) -> Result<Option<ReportOrder>> {
            let stale = self
                .stale_reads
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if stale {
                return Ok(None);
            }
            self.inner.find_by_id(order_id).await
        }

        async fn find_by_predicate(
            &self,
            predicate: &(dyn for<'a> Fn(&'a ReportOrder) -> bool + Send + Sync),
        ) -> Result<Vec<ReportOrder>> {
            self.inner.find_by_predicate(predicate).await
        }

        async fn save(&self, order: &ReportOrder) -> Result<()> {
            self.inner.save(order).await
        }

        async fn insert_if_absent(&self, order: &ReportOrder) -> Result<bool> {
            self.inner.insert_if_absent(order).await
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 30).unwrap()
    }

    fn service() -> ReportProcessingService<InMemoryReportStore> {
        ReportProcessingService::new(InMemoryReportStore::new(), Arc::new(FixedClock::new(now())))
    }

    fn placed(order_id: OrderId) -> RecordPlaced {
        RecordPlaced {
            order_id,
            table_id: 5,
            created_at: Some(now() - Duration::seconds(30)),
            items: vec![
                ReportItem {
                    product_id: ProductId::new(1),
                    product_name: Some("Burger".into()),
                    quantity: 2,
                    price: Some(Money::from_cents(1550)),
                },
                ReportItem {
                    product_id: ProductId::new(2),
                    product_name: Some("Soda".into()),
                    quantity: 1,
                    price: Some(Money::from_cents(300)),
                },
            ],
        }
    }

    #[tokio::test]
    async fn test_placed_creates_pending_projection() {
        let service = service();
        let cmd = placed(OrderId::new());

        let outcome = service.record_placed(cmd.clone()).await.unwrap();

        assert_eq!(outcome, UpsertOutcome::Created);
        let order = service.store().find_by_id(cmd.order_id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.table_id, 5);
        assert_eq!(order.created_at, cmd.created_at.unwrap());
        assert_eq!(order.received_at, now());
        assert_eq!(order.items, cmd.items);
    }

    #[tokio::test]
    async fn test_placed_twice_is_skipped() {
        let service = service();
        let cmd = placed(OrderId::new());

        service.record_placed(cmd.clone()).await.unwrap();
        let outcome = service.record_placed(cmd.clone()).await.unwrap();

        assert_eq!(outcome, UpsertOutcome::Skipped);
        assert_eq!(service.store().len().await, 1);
        let order = service.store().find_by_id(cmd.order_id).await.unwrap().unwrap();
        assert_eq!(order.items.len(), 2);
    }

    #[tokio::test]
    async fn test_ready_updates_status_only() {
        let service = service();
        let cmd = placed(OrderId::new());
        service.record_placed(cmd.clone()).await.unwrap();
        let before = service.store().find_by_id(cmd.order_id).await.unwrap().unwrap();

        let outcome = service
            .record_ready(RecordReady {
                order_id: cmd.order_id,
                updated_at: Some(now() + Duration::minutes(10)),
            })
            .await
            .unwrap();

        assert_eq!(outcome, UpsertOutcome::Updated);
        let after = service.store().find_by_id(cmd.order_id).await.unwrap().unwrap();
        assert_eq!(after.status, OrderStatus::Ready);
        assert_eq!(
            ReportOrder {
                status: OrderStatus::Pending,
                ..after
            },
            before
        );
    }

    #[tokio::test]
    async fn test_ready_before_placed_creates_stub_and_placed_is_skipped() {
        let service = service();
        let order_id = OrderId::new();
        let ready_at = now() - Duration::minutes(1);

        let outcome = service
            .record_ready(RecordReady {
                order_id,
                updated_at: Some(ready_at),
            })
            .await
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::StubCreated);

        let stub = service.store().find_by_id(order_id).await.unwrap().unwrap();
        assert_eq!(stub.status, OrderStatus::Ready);
        assert_eq!(stub.table_id, 0);
        assert!(stub.items.is_empty());
        assert_eq!(stub.created_at, ready_at);
        assert_eq!(stub.received_at, now());

        let outcome = service.record_placed(placed(order_id)).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::Skipped);
        let still_stub = service.store().find_by_id(order_id).await.unwrap().unwrap();
        assert_eq!(still_stub, stub);
    }

    #[tokio::test]
    async fn test_missing_timestamps_fall_back_to_clock() {
        let service = service();
        let mut cmd = placed(OrderId::new());
        cmd.created_at = None;
        service.record_placed(cmd.clone()).await.unwrap();
        let order = service.store().find_by_id(cmd.order_id).await.unwrap().unwrap();
        assert_eq!(order.created_at, now());

        let order_id = OrderId::new();
        service
            .record_ready(RecordReady {
                order_id,
                updated_at: None,
            })
            .await
            .unwrap();
        let stub = service.store().find_by_id(order_id).await.unwrap().unwrap();
        assert_eq!(stub.created_at, now());
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let service = service();
        service.store().set_unavailable(true);

        let err = service.record_placed(placed(OrderId::new())).await.unwrap_err();
        assert!(matches!(err, ReportError::Store(_)));
    }

    #[tokio::test]
    async fn test_placed_racing_a_ready_stub_does_not_overwrite_it() {
        let inner = InMemoryReportStore::new();
        let order_id = OrderId::new();
        let stub = ReportOrder::ready_stub(order_id, now(), now());
        inner.save(&stub).await.unwrap();
        let service = ReportProcessingService::new(
            StaleReadStore::new(inner, 1),
            Arc::new(FixedClock::new(now())),
        );

        let outcome = service.record_placed(placed(order_id)).await.unwrap();

        assert_eq!(outcome, UpsertOutcome::Skipped);
        let row = service.store().inner.find_by_id(order_id).await.unwrap().unwrap();
        assert_eq!(row.status, OrderStatus::Ready);
        assert_eq!(row, stub);
    }

    #[tokio::test]
    async fn test_ready_racing_placed_marks_projected_row_ready() {
        let inner = InMemoryReportStore::new();
        let cmd = placed(OrderId::new());
        let clock = Arc::new(FixedClock::new(now()));
        ReportProcessingService::new(inner.clone(), clock.clone())
            .record_placed(cmd.clone())
            .await
            .unwrap();
        let service = ReportProcessingService::new(StaleReadStore::new(inner, 1), clock);

        let outcome = service
            .record_ready(RecordReady {
                order_id: cmd.order_id,
                updated_at: Some(now()),
            })
            .await
            .unwrap();

        assert_eq!(outcome, UpsertOutcome::Updated);
        let row = service.store().inner.find_by_id(cmd.order_id).await.unwrap().unwrap();
        assert_eq!(row.status, OrderStatus::Ready);
        assert_eq!(row.table_id, 5);
        assert_eq!(row.items, cmd.items);
    }
}
