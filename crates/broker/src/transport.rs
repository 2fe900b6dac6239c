use async_trait::async_trait;

use crate::error::TransportError;
use crate::message::Message;

/// Outbound port for publishing to an exchange.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Publishes a message. Returns once the broker has accepted it.
    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        message: Message,
    ) -> Result<(), TransportError>;
}
