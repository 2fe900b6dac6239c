//! Inbound decoding and contract validation.
//!
//! Consumers decode leniently (every field optional, unknown fields ignored)
//! and then check the contract explicitly, so that a missing field is a
//! contract error rather than an opaque deserialization failure.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use common::{EventId, Money, OrderId, TableId};
use serde::Deserialize;

use crate::envelope::{EVENT_TYPE_HEADER, EVENT_VERSION_HEADER, SUPPORTED_VERSION};
use crate::payload::PlacedItem;
use crate::{ContractError, ORDER_PLACED, ORDER_READY, Result};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InboundEnvelope<P> {
    #[serde(default)]
    event_id: Option<EventId>,
    #[serde(default)]
    event_type: Option<String>,
    #[serde(default)]
    event_version: Option<i64>,
    #[serde(default)]
    occurred_at: Option<DateTime<Utc>>,
    payload: Option<P>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InboundPlaced {
    #[serde(default)]
    order_id: Option<OrderId>,
    #[serde(default)]
    table_id: Option<i64>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    items: Option<Vec<PlacedItem>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InboundReady {
    #[serde(default)]
    order_id: Option<OrderId>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

/// A validated `order.placed` event.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderPlaced {
    pub event_id: Option<EventId>,
    pub occurred_at: Option<DateTime<Utc>>,
    pub order_id: OrderId,
    pub table_id: TableId,
    /// Business time of the order; absent on some legacy producers.
    pub created_at: Option<DateTime<Utc>>,
    pub items: Vec<PlacedItem>,
}

/// A validated `order.ready` event.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderReady {
    pub event_id: Option<EventId>,
    pub occurred_at: Option<DateTime<Utc>>,
    pub order_id: OrderId,
    pub updated_at: Option<DateTime<Utc>>,
}

fn parse<P: for<'de> Deserialize<'de>>(body: &[u8]) -> Result<InboundEnvelope<P>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ContractError::MissingEvent);
    }
    let envelope: Option<InboundEnvelope<P>> = serde_json::from_slice(body)?;
    envelope.ok_or(ContractError::MissingEvent)
}

fn check_version(version: Option<i64>) -> Result<()> {
    match version {
        None => Err(ContractError::MissingVersion),
        Some(SUPPORTED_VERSION) => Ok(()),
        Some(other) => Err(ContractError::UnsupportedVersion(other)),
    }
}

/// Highest accepted unit price on an inbound item.
pub const MAX_ITEM_PRICE: Money = Money::from_cents(100_000_000);

fn check_prices(items: &[PlacedItem]) -> Result<()> {
    for item in items {
        match item.price {
            Some(price) if price.cents() < 0 || price > MAX_ITEM_PRICE => {
                return Err(ContractError::InvalidPrice {
                    product_id: item.product_id,
                    price,
                    max: MAX_ITEM_PRICE,
                });
            }
            _ => {}
        }
    }
    Ok(())
}

fn check_event_type(actual: Option<&str>, expected: &'static str) -> Result<()> {
    match actual {
        Some(actual) if actual != expected => Err(ContractError::UnexpectedEventType {
            expected,
            actual: actual.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Decodes and validates an `order.placed` message body.
pub fn decode_order_placed(body: &[u8]) -> Result<OrderPlaced> {
    let envelope: InboundEnvelope<InboundPlaced> = parse(body)?;

    check_version(envelope.event_version)?;
    check_event_type(envelope.event_type.as_deref(), ORDER_PLACED)?;

    let payload = envelope.payload.unwrap_or_default();
    let order_id = payload.order_id.ok_or(ContractError::MissingOrderId)?;
    let table_id = payload
        .table_id
        .filter(|id| *id > 0)
        .and_then(|id| TableId::try_from(id).ok())
        .ok_or(ContractError::InvalidTableId)?;

    let items = payload.items.unwrap_or_default();
    check_prices(&items)?;

    Ok(OrderPlaced {
        event_id: envelope.event_id,
        occurred_at: envelope.occurred_at,
        order_id,
        table_id,
        created_at: payload.created_at,
        items,
    })
}

/// Decodes and validates an `order.ready` message body.
pub fn decode_order_ready(body: &[u8]) -> Result<OrderReady> {
    let envelope: InboundEnvelope<InboundReady> = parse(body)?;

    check_version(envelope.event_version)?;
    check_event_type(envelope.event_type.as_deref(), ORDER_READY)?;

    let payload = envelope.payload.unwrap_or_default();
    let order_id = payload.order_id.ok_or(ContractError::MissingOrderId)?;

    Ok(OrderReady {
        event_id: envelope.event_id,
        occurred_at: envelope.occurred_at,
        order_id,
        updated_at: payload.updated_at,
    })
}

/// Cheap pre-check against the `eventType` / `eventVersion` headers.
///
/// Absent headers pass; the body is still validated afterwards. A version
/// header may be a number or a numeric string; anything else is ignored and
/// left to the body.
pub fn check_headers(
    headers: &BTreeMap<String, serde_json::Value>,
    expected_type: &'static str,
) -> Result<()> {
    let version = headers.get(EVENT_VERSION_HEADER).and_then(|v| {
        v.as_i64()
            .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
    });
    match version {
        None | Some(SUPPORTED_VERSION) => {}
        Some(other) => return Err(ContractError::UnsupportedVersion(other)),
    }
    if let Some(event_type) = headers.get(EVENT_TYPE_HEADER).and_then(|v| v.as_str()) {
        check_event_type(Some(event_type), expected_type)?;
    }
    Ok(())
}
