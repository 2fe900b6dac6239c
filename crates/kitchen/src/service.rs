//! Applies placed orders to the kitchen projection.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::{Clock, OrderId, OrderStatus, TableId};
use event_contract::OrderPlaced;

use crate::error::Result;
use crate::projection::KitchenOrder;
use crate::store::KitchenOrderStore;

/// Command derived from a validated `order.placed` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartPreparation {
    pub order_id: OrderId,
    pub table_id: TableId,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<OrderPlaced> for StartPreparation {
    fn from(event: OrderPlaced) -> Self {
        Self {
            order_id: event.order_id,
            table_id: event.table_id,
            created_at: event.created_at,
        }
    }
}

/// Find-or-create then force IN_PREPARATION.
pub struct KitchenService<S> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S: KitchenOrderStore> KitchenService<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Upserts the projection and marks it IN_PREPARATION.
    ///
    /// A missing projection starts from a PENDING baseline built from the
    /// event; `created_at` falls back to the clock when the event has none.
    /// Reprocessing the same command ends in the same state.
    #[tracing::instrument(skip(self, cmd), fields(order_id = %cmd.order_id, table_id = cmd.table_id))]
    pub async fn start_preparation(&self, cmd: StartPreparation) -> Result<KitchenOrder> {
        let now = self.clock.now();

        let mut order = match self.store.find_by_id(cmd.order_id).await? {
            Some(existing) => existing,
            None => {
                tracing::info!("Order not known to the kitchen yet, creating projection");
                KitchenOrder::pending(cmd.order_id, cmd.table_id, cmd.created_at.unwrap_or(now))
            }
        };

        order.start_preparation(now);
        self.store.save(&order).await?;

        tracing::info!(status = %order.status, "Order in preparation");
        Ok(order)
    }

    /// Orders currently being prepared, oldest first.
    pub async fn in_preparation(&self) -> Result<Vec<KitchenOrder>> {
        self.store
            .find_by_predicate(&|order: &KitchenOrder| order.status == OrderStatus::InPreparation)
            .await
    }
}
