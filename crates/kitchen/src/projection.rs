use chrono::{DateTime, Utc};
use common::{OrderId, OrderStatus, TableId};
use serde::{Deserialize, Serialize};

/// The kitchen's copy of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KitchenOrder {
    pub order_id: OrderId,
    pub table_id: TableId,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl KitchenOrder {
    /// A PENDING baseline, created the first time the kitchen hears of an order.
    pub fn pending(order_id: OrderId, table_id: TableId, created_at: DateTime<Utc>) -> Self {
        Self {
            order_id,
            table_id,
            status: OrderStatus::Pending,
            created_at,
            updated_at: created_at,
        }
    }

    /// Forces the projection to IN_PREPARATION whatever its current status.
    ///
    /// The projection mirrors the producer rather than enforcing the state
    /// machine, so replaying the same event always ends in the same state.
    pub fn start_preparation(&mut self, now: DateTime<Utc>) {
        self.status = OrderStatus::InPreparation;
        self.updated_at = now;
    }
}
