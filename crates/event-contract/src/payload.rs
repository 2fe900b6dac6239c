use chrono::{DateTime, Utc};
use common::{Money, OrderId, OrderStatus, ProductId, TableId};
use serde::{Deserialize, Serialize};

/// Payload of an `order.placed` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPlacedPayload {
    pub order_id: OrderId,
    pub table_id: TableId,
    pub created_at: DateTime<Utc>,
    pub items: Vec<PlacedItem>,
}

/// A line item inside `order.placed`.
///
/// `price` and `product_name` are catalog enrichment and may be absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedItem {
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(default)]
    pub price: Option<Money>,
    #[serde(default)]
    pub product_name: Option<String>,
}

impl PlacedItem {
    /// Line total, with a missing price counted as zero.
    pub fn line_total(&self) -> Money {
        self.price.unwrap_or_default().multiply(self.quantity)
    }
}

/// Payload of an `order.ready` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderReadyPayload {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub updated_at: DateTime<Utc>,
}
