use chrono::{DateTime, Utc};
use common::EventId;
use serde::{Deserialize, Serialize};

/// Version of the envelope every consumer in this system understands.
pub const SUPPORTED_VERSION: i64 = 1;

/// `eventType` of the event published when an order is created.
pub const ORDER_PLACED: &str = "order.placed";

/// `eventType` of the event published when an order reaches READY.
pub const ORDER_READY: &str = "order.ready";

/// Message header mirroring `eventType`.
pub const EVENT_TYPE_HEADER: &str = "eventType";

/// Message header mirroring `eventVersion`.
pub const EVENT_VERSION_HEADER: &str = "eventVersion";

/// A versioned envelope around an event payload.
///
/// Serialized in camelCase:
/// `{eventId, eventType, eventVersion, occurredAt, payload}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope<P> {
    /// Unique identifier for this event.
    pub event_id: EventId,

    /// The type of the event (`order.placed`, `order.ready`).
    pub event_type: String,

    /// Contract version of the envelope and payload.
    pub event_version: i64,

    /// When the event was produced.
    pub occurred_at: DateTime<Utc>,

    /// The event payload.
    pub payload: P,
}

impl<P> EventEnvelope<P> {
    /// Wraps a payload in a current-version envelope with a fresh event ID.
    pub fn new(event_type: impl Into<String>, occurred_at: DateTime<Utc>, payload: P) -> Self {
        Self {
            event_id: EventId::new(),
            event_type: event_type.into(),
            event_version: SUPPORTED_VERSION,
            occurred_at,
            payload,
        }
    }

    /// Replaces the generated event ID.
    pub fn with_event_id(mut self, event_id: EventId) -> Self {
        self.event_id = event_id;
        self
    }

    /// Replaces the envelope version. Only useful for contract tests.
    pub fn with_version(mut self, event_version: i64) -> Self {
        self.event_version = event_version;
        self
    }

    /// Header pairs mirroring the envelope, attached to the outbound message.
    pub fn headers(&self) -> [(&'static str, serde_json::Value); 2] {
        [
            (
                EVENT_TYPE_HEADER,
                serde_json::Value::from(self.event_type.clone()),
            ),
            (
                EVENT_VERSION_HEADER,
                serde_json::Value::from(self.event_version),
            ),
        ]
    }
}

impl<P: Serialize> EventEnvelope<P> {
    /// Serializes the envelope to a JSON message body.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
