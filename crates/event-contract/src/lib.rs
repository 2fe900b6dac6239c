//! Wire contract for order lifecycle events.
//!
//! Producer and consumers share this crate so they agree on:
//! - the envelope `{eventId, eventType, eventVersion, occurredAt, payload}`
//! - the `order.placed` and `order.ready` payloads
//! - the `eventType` / `eventVersion` message headers
//! - contract validation for inbound messages

pub mod envelope;
pub mod error;
pub mod payload;
pub mod validation;

pub use envelope::{
    EVENT_TYPE_HEADER, EVENT_VERSION_HEADER, EventEnvelope, ORDER_PLACED, ORDER_READY,
    SUPPORTED_VERSION,
};
pub use error::{ContractError, Result};
pub use payload::{OrderPlacedPayload, OrderReadyPayload, PlacedItem};
pub use validation::{
    MAX_ITEM_PRICE, OrderPlaced, OrderReady, check_headers, decode_order_placed, decode_order_ready,
};
