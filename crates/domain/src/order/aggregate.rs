//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{OrderId, OrderStatus, ProductId, TableId};
use serde::{Deserialize, Serialize};

use super::{OrderError, OrderItem};

/// Order aggregate root.
///
/// Owns its line items by value. Status changes go through
/// [`apply_transition`](Order::apply_transition) so every caller, HTTP or
/// message driven, hits the same guard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    table_id: TableId,
    status: OrderStatus,
    items: Vec<OrderItem>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    deleted: bool,
    #[serde(default)]
    deleted_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Places a new PENDING order.
    ///
    /// Fails if the table id is not positive, there are no items, or an item
    /// has a zero quantity.
    pub fn place(
        table_id: TableId,
        items: Vec<OrderItem>,
        now: DateTime<Utc>,
    ) -> Result<Self, OrderError> {
        if table_id <= 0 {
            return Err(OrderError::InvalidTableId(table_id));
        }
        if items.is_empty() {
            return Err(OrderError::NoItems);
        }
        if let Some(item) = items.iter().find(|item| item.quantity == 0) {
            return Err(OrderError::InvalidQuantity {
                product_id: item.product_id,
                quantity: item.quantity,
            });
        }

        Ok(Self {
            id: OrderId::new(),
            table_id,
            status: OrderStatus::Pending,
            items,
            created_at: now,
            updated_at: now,
            deleted: false,
            deleted_at: None,
        })
    }

    /// Moves the order to `target` if the state machine allows it.
    ///
    /// Leaves the order untouched on failure.
    pub fn apply_transition(
        &mut self,
        target: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<(), OrderError> {
        self.status = self.status.transition_to(target)?;
        self.updated_at = now;
        Ok(())
    }

    /// Marks the order deleted. Deleting twice keeps the first timestamp.
    pub fn soft_delete(&mut self, now: DateTime<Utc>) {
        if !self.deleted {
            self.deleted = true;
            self.deleted_at = Some(now);
        }
    }
}

// Query methods
impl Order {
    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns all items in insertion order.
    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    /// Returns the item at `index`.
    pub fn item(&self, index: usize) -> Option<&OrderItem> {
        self.items.get(index)
    }

    /// Returns the distinct product ids, in first-seen order.
    pub fn product_ids(&self) -> Vec<ProductId> {
        let mut ids = Vec::with_capacity(self.items.len());
        for item in &self.items {
            if !ids.contains(&item.product_id) {
                ids.push(item.product_id);
            }
        }
        ids
    }

    /// Returns the total quantity of all items.
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}
