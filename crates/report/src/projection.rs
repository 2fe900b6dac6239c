//! The report's copy of an order.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, OrderStatus, ProductId, TableId};
use event_contract::PlacedItem;
use serde::{Deserialize, Serialize};

/// A line item as the report stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportItem {
    pub product_id: ProductId,
    pub product_name: Option<String>,
    pub quantity: u32,
    pub price: Option<Money>,
}

impl ReportItem {
    /// `price * quantity`, missing price counted as zero.
    pub fn line_total(&self) -> Money {
        self.price.unwrap_or_default().multiply(self.quantity)
    }
}

impl From<PlacedItem> for ReportItem {
    fn from(item: PlacedItem) -> Self {
        Self {
            product_id: item.product_id,
            product_name: item.product_name,
            quantity: item.quantity,
            price: item.price,
        }
    }
}

/// Report projection keyed by order id.
///
/// `created_at` is business time from the producer. `received_at` is when
/// this consumer first recorded the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportOrder {
    pub order_id: OrderId,
    pub table_id: TableId,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub received_at: DateTime<Utc>,
    pub items: Vec<ReportItem>,
}

impl ReportOrder {
    /// Placeholder for an order whose READY event arrived before its
    /// placed event. Table 0, no items.
    pub fn ready_stub(order_id: OrderId, updated_at: DateTime<Utc>, received_at: DateTime<Utc>) -> Self {
        Self {
            order_id,
            table_id: 0,
            status: OrderStatus::Ready,
            created_at: updated_at,
            received_at,
            items: Vec::new(),
        }
    }

    /// True for rows created by [`ready_stub`](Self::ready_stub).
    pub fn is_stub(&self) -> bool {
        self.table_id == 0 && self.items.is_empty()
    }

    pub fn total(&self) -> Money {
        self.items.iter().map(ReportItem::line_total).sum()
    }
}
