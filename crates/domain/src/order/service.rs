//! Order service: validation, persistence and event publication.

use std::collections::HashMap;
use std::sync::Arc;

use broker::Transport;
use common::{Clock, OrderId, OrderStatus};

use super::{CreateOrder, Order, OrderError, Result, UpdateOrderStatus};
use crate::catalog::{Product, ProductCatalog};
use crate::events::OrderEventBuilder;
use crate::publisher::EventPublisher;
use crate::repository::OrderRepository;

/// Service for managing orders.
///
/// Mutations publish before they persist. If the broker refuses the event the
/// caller gets [`OrderError::EventPublication`] and the store is left as it
/// was. A save failing after a successful publish leaves an event for an
/// order the store does not have; consumers key on order id and tolerate it.
pub struct OrderService<R, C, T> {
    repository: R,
    events: OrderEventBuilder<C>,
    publisher: EventPublisher<T>,
    clock: Arc<dyn Clock>,
}

impl<R, C, T> OrderService<R, C, T>
where
    R: OrderRepository,
    C: ProductCatalog,
    T: Transport,
{
    pub fn new(
        repository: R,
        catalog: C,
        publisher: EventPublisher<T>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            events: OrderEventBuilder::new(catalog, clock.clone()),
            publisher,
            clock,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Places an order and publishes `order.placed`.
    #[tracing::instrument(skip(self, cmd), fields(table_id = cmd.table_id, items = cmd.items.len()))]
    pub async fn create_order(&self, cmd: CreateOrder) -> Result<Order> {
        let order = Order::place(cmd.table_id, cmd.items, self.clock.now())?;
        self.ensure_orderable(&order).await?;

        let envelope = self.events.build_placed_event(&order).await?;
        self.publisher.publish(&envelope).await?;
        self.repository.save(&order).await?;

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(order_id = %order.id(), event_id = %envelope.event_id, "Order created");
        Ok(order)
    }

    /// Loads an active order.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order> {
        self.repository
            .find_by_id(order_id)
            .await?
            .filter(|order| !order.is_deleted())
            .ok_or(OrderError::OrderNotFound(order_id))
    }

    /// Lists active orders, oldest first. An empty filter returns all of them.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders(&self, statuses: &[OrderStatus]) -> Result<Vec<Order>> {
        let orders = self
            .repository
            .find_by_predicate(&|order: &Order| {
                !order.is_deleted() && (statuses.is_empty() || statuses.contains(&order.status()))
            })
            .await?;
        Ok(orders)
    }

    /// Moves an order along the state machine; publishes `order.ready` on READY.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(&self, cmd: UpdateOrderStatus) -> Result<Order> {
        let mut order = self.get_order(cmd.order_id).await?;
        let previous = order.status();
        order.apply_transition(cmd.status, self.clock.now())?;

        if order.status() == OrderStatus::Ready {
            let envelope = self.events.build_ready_event(&order);
            self.publisher.publish(&envelope).await?;
        }
        self.repository.save(&order).await?;

        metrics::counter!("order_status_changes_total", "status" => order.status().as_str())
            .increment(1);
        tracing::info!(order_id = %order.id(), from = %previous, to = %order.status(), "Order status updated");
        Ok(order)
    }

    /// Active catalog products, ascending by id.
    pub async fn menu(&self) -> Result<Vec<Product>> {
        Ok(self.events.catalog().find_active().await?)
    }

    /// Soft-deletes an order. Publishes nothing.
    ///
    /// Deleting an already deleted order succeeds and keeps its original
    /// `deleted_at`; only an unknown id is `OrderNotFound`.
    #[tracing::instrument(skip(self))]
    pub async fn delete_order(&self, order_id: OrderId) -> Result<()> {
        let mut order = self
            .repository
            .find_by_id(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))?;
        order.soft_delete(self.clock.now());
        self.repository.save(&order).await?;
        tracing::info!(%order_id, "Order deleted");
        Ok(())
    }

    /// Soft-deletes every active order and returns how many were deleted.
    #[tracing::instrument(skip(self))]
    pub async fn delete_all_orders(&self) -> Result<usize> {
        let now = self.clock.now();
        let active = self
            .repository
            .find_by_predicate(&|order: &Order| !order.is_deleted())
            .await?;

        for mut order in active.iter().cloned() {
            order.soft_delete(now);
            self.repository.save(&order).await?;
        }
        tracing::info!(count = active.len(), "All orders deleted");
        Ok(active.len())
    }

    /// Every product on the order must exist in the catalog and be active.
    async fn ensure_orderable(&self, order: &Order) -> Result<()> {
        let ids = order.product_ids();
        let products: HashMap<_, _> = self
            .events
            .catalog()
            .find_all_by_id(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p.active))
            .collect();

        match ids.into_iter().find(|id| products.get(id) != Some(&true)) {
            Some(missing) => Err(OrderError::ProductNotFound(missing)),
            None => Ok(()),
        }
    }
}
