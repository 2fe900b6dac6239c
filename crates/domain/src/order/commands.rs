//! Inputs to the order service.

use common::{OrderId, OrderStatus, TableId};
use serde::{Deserialize, Serialize};

use super::OrderItem;

/// Place a new order for a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateOrder {
    pub table_id: TableId,
    pub items: Vec<OrderItem>,
}

impl CreateOrder {
    pub fn new(table_id: TableId, items: Vec<OrderItem>) -> Self {
        Self { table_id, items }
    }
}

/// Move an existing order to another status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOrderStatus {
    pub order_id: OrderId,
    pub status: OrderStatus,
}

impl UpdateOrderStatus {
    pub fn new(order_id: OrderId, status: OrderStatus) -> Self {
        Self { order_id, status }
    }
}
