//! Builds versioned envelopes from an order.

use std::collections::HashMap;
use std::sync::Arc;

use common::Clock;
use event_contract::{
    EventEnvelope, ORDER_PLACED, ORDER_READY, OrderPlacedPayload, OrderReadyPayload, PlacedItem,
};

use crate::catalog::ProductCatalog;
use crate::order::{Order, Result};

/// Turns order state into `order.placed` / `order.ready` envelopes.
pub struct OrderEventBuilder<C> {
    catalog: C,
    clock: Arc<dyn Clock>,
}

impl<C: ProductCatalog> OrderEventBuilder<C> {
    pub fn new(catalog: C, clock: Arc<dyn Clock>) -> Self {
        Self { catalog, clock }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Builds `order.placed`, enriching each item with catalog price and name.
    ///
    /// Products are fetched in one batch. A product missing from the catalog
    /// gets a zero price and no name; publication never waits on catalog
    /// completeness.
    pub async fn build_placed_event(
        &self,
        order: &Order,
    ) -> Result<EventEnvelope<OrderPlacedPayload>> {
        let products: HashMap<_, _> = self
            .catalog
            .find_all_by_id(&order.product_ids())
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let items = order
            .items()
            .iter()
            .map(|item| {
                let product = products.get(&item.product_id);
                if product.is_none() {
                    tracing::warn!(product_id = %item.product_id, "Product missing from catalog, publishing without price");
                }
                PlacedItem {
                    product_id: item.product_id,
                    quantity: item.quantity,
                    price: Some(product.map(|p| p.price).unwrap_or_default()),
                    product_name: product.map(|p| p.name.clone()),
                }
            })
            .collect();

        let payload = OrderPlacedPayload {
            order_id: order.id(),
            table_id: order.table_id(),
            created_at: order.created_at(),
            items,
        };
        Ok(EventEnvelope::new(ORDER_PLACED, self.clock.now(), payload))
    }

    /// Builds `order.ready` from the order's current status.
    pub fn build_ready_event(&self, order: &Order) -> EventEnvelope<OrderReadyPayload> {
        let payload = OrderReadyPayload {
            order_id: order.id(),
            status: order.status(),
            updated_at: order.updated_at(),
        };
        EventEnvelope::new(ORDER_READY, self.clock.now(), payload)
    }
}
