//! Order aggregate and the service that drives it.

mod aggregate;
mod commands;
mod service;
mod value_objects;

pub use aggregate::Order;
pub use commands::{CreateOrder, UpdateOrderStatus};
pub use service::OrderService;
pub use value_objects::OrderItem;

use broker::TransportError;
use common::{OrderId, ProductId, StatusError, TableId};
use thiserror::Error;

use crate::error::RepositoryError;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Table id must be positive.
    #[error("Invalid table id: {0} (must be greater than 0)")]
    InvalidTableId(TableId),

    /// Order has no items.
    #[error("Order must contain at least one item")]
    NoItems,

    /// Item quantity must be at least one.
    #[error("Invalid quantity {quantity} for product {product_id} (must be at least 1)")]
    InvalidQuantity { product_id: ProductId, quantity: u32 },

    /// Product is unknown to the catalog or inactive.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// Order does not exist or was deleted.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// Status change rejected by the state machine.
    #[error(transparent)]
    InvalidTransition(#[from] StatusError),

    /// The broker did not accept the event.
    #[error("Failed to publish {event_type} event: {source}")]
    EventPublication {
        event_type: String,
        #[source]
        source: TransportError,
    },

    /// Envelope could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Order or catalog store failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Result type for order operations.
pub type Result<T> = std::result::Result<T, OrderError>;
