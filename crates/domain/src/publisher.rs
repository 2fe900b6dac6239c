//! Hands envelopes to the broker transport.

use broker::{Message, Transport};
use event_contract::{EventEnvelope, ORDER_PLACED, ORDER_READY};
use serde::Serialize;

use crate::order::{OrderError, Result};

/// Where events are published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublisherConfig {
    pub exchange: String,
    pub placed_routing_key: String,
    pub ready_routing_key: String,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            exchange: "order.exchange".to_string(),
            placed_routing_key: ORDER_PLACED.to_string(),
            ready_routing_key: ORDER_READY.to_string(),
        }
    }
}

impl PublisherConfig {
    fn routing_key<'a>(&'a self, event_type: &'a str) -> &'a str {
        match event_type {
            ORDER_PLACED => &self.placed_routing_key,
            ORDER_READY => &self.ready_routing_key,
            other => other,
        }
    }
}

/// Publishes envelopes with `eventType` / `eventVersion` headers.
///
/// Makes exactly one publish attempt per call; redelivery is the broker's job.
pub struct EventPublisher<T> {
    transport: T,
    config: PublisherConfig,
}

impl<T: Transport> EventPublisher<T> {
    pub fn new(transport: T, config: PublisherConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    /// Serializes and publishes an envelope.
    ///
    /// Transport failures surface as [`OrderError::EventPublication`].
    #[tracing::instrument(
        skip(self, envelope),
        fields(event_id = %envelope.event_id, event_type = %envelope.event_type)
    )]
    pub async fn publish<P: Serialize + Sync>(&self, envelope: &EventEnvelope<P>) -> Result<()> {
        let mut message = Message::new(envelope.to_bytes()?);
        for (key, value) in envelope.headers() {
            message.headers.insert(key.to_string(), value);
        }

        let routing_key = self.config.routing_key(&envelope.event_type);
        match self
            .transport
            .publish(&self.config.exchange, routing_key, message)
            .await
        {
            Ok(()) => {
                metrics::counter!("events_published_total").increment(1);
                tracing::info!(routing_key, "Event published");
                Ok(())
            }
            Err(source) => {
                metrics::counter!("event_publish_failures_total").increment(1);
                tracing::error!(routing_key, error = %source, "Event publication failed");
                Err(OrderError::EventPublication {
                    event_type: envelope.event_type.clone(),
                    source,
                })
            }
        }
    }
}
