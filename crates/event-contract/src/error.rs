use common::{Money, ProductId};
use thiserror::Error;

/// Contract violations found on an inbound event.
///
/// These are permanent: a message that fails here will fail identically on
/// every redelivery.
#[derive(Debug, Error)]
pub enum ContractError {
    /// The message carried no event at all.
    #[error("Event payload is null")]
    MissingEvent,

    /// `eventVersion` is absent.
    #[error("Event version is missing")]
    MissingVersion,

    /// `eventVersion` is not the version this consumer understands.
    #[error("Unsupported event version: {0}")]
    UnsupportedVersion(i64),

    /// `eventType` is present but names another event.
    #[error("Unexpected eventType: {actual} (expected {expected})")]
    UnexpectedEventType {
        expected: &'static str,
        actual: String,
    },

    /// `payload.orderId` is absent.
    #[error("orderId is required")]
    MissingOrderId,

    /// `payload.tableId` is absent or not positive.
    #[error("tableId must be a positive integer")]
    InvalidTableId,

    /// An item price is negative or above [`MAX_ITEM_PRICE`](crate::MAX_ITEM_PRICE).
    #[error("price {price} for product {product_id} is outside 0..={max}")]
    InvalidPrice {
        product_id: ProductId,
        price: Money,
        max: Money,
    },

    /// The body is not a JSON document of the expected shape.
    #[error("Malformed event: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Result type for contract operations.
pub type Result<T> = std::result::Result<T, ContractError>;
