//! Broker handler for the kitchen work queue.

use std::sync::Arc;

use async_trait::async_trait;
use broker::{HandlerError, Message, MessageHandler};
use event_contract::{ORDER_PLACED, check_headers, decode_order_placed};

use crate::error::KitchenError;
use crate::service::{KitchenService, StartPreparation};
use crate::store::KitchenOrderStore;

/// Validates `order.placed` messages and hands them to the service.
///
/// Contract violations are rejected without requeue. Store failures are
/// returned as transient so the broker retries them.
pub struct OrderPlacedListener<S> {
    service: Arc<KitchenService<S>>,
}

impl<S> OrderPlacedListener<S> {
    pub fn new(service: Arc<KitchenService<S>>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S: KitchenOrderStore + 'static> MessageHandler for OrderPlacedListener<S> {
    async fn handle(&self, message: &Message) -> Result<(), HandlerError> {
        let event = check_headers(&message.headers, ORDER_PLACED)
            .and_then(|()| decode_order_placed(&message.body))
            .map_err(|e| {
                tracing::error!(error = %e, "Rejecting order.placed: contract violation");
                KitchenError::from(e)
            })?;

        tracing::debug!(order_id = %event.order_id, event_id = ?event.event_id, "Received order.placed");
        self.service
            .start_preparation(StartPreparation::from(event))
            .await?;
        Ok(())
    }
}
