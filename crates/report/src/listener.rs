//! Broker handlers for the two report work queues.

use std::sync::Arc;

use async_trait::async_trait;
use broker::{HandlerError, Message, MessageHandler};
use event_contract::{
    ContractError, ORDER_PLACED, ORDER_READY, check_headers, decode_order_placed, decode_order_ready,
};

use crate::error::ReportError;
use crate::processing::{RecordPlaced, RecordReady, ReportProcessingService};
use crate::store::ReportOrderStore;

fn reject(event_type: &'static str, e: ContractError) -> ReportError {
    tracing::error!(event_type, error = %e, "Rejecting message: contract violation");
    ReportError::from(e)
}

/// Handles the `order.placed` queue.
pub struct OrderPlacedReportListener<S> {
    service: Arc<ReportProcessingService<S>>,
}

impl<S> OrderPlacedReportListener<S> {
    pub fn new(service: Arc<ReportProcessingService<S>>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S: ReportOrderStore + 'static> MessageHandler for OrderPlacedReportListener<S> {
    async fn handle(&self, message: &Message) -> Result<(), HandlerError> {
        let event = check_headers(&message.headers, ORDER_PLACED)
            .and_then(|()| decode_order_placed(&message.body))
            .map_err(|e| reject(ORDER_PLACED, e))?;

        self.service
            .record_placed(RecordPlaced::from(event))
            .await?;
        Ok(())
    }
}

/// Handles the `order.ready` queue.
pub struct OrderReadyReportListener<S> {
    service: Arc<ReportProcessingService<S>>,
}

impl<S> OrderReadyReportListener<S> {
    pub fn new(service: Arc<ReportProcessingService<S>>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S: ReportOrderStore + 'static> MessageHandler for OrderReadyReportListener<S> {
    async fn handle(&self, message: &Message) -> Result<(), HandlerError> {
        let event = check_headers(&message.headers, ORDER_READY)
            .and_then(|()| decode_order_ready(&message.body))
            .map_err(|e| reject(ORDER_READY, e))?;

        self.service.record_ready(RecordReady::from(event)).await?;
        Ok(())
    }
}
