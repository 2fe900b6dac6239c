//! Producer side of the order pipeline.
//!
//! This crate provides:
//! - [`Order`] aggregate with the status guard applied at the point of mutation
//! - [`ProductCatalog`] and [`OrderRepository`] ports with in-memory adapters
//! - [`OrderEventBuilder`] turning an order into a versioned envelope
//! - [`EventPublisher`] handing envelopes to a broker [`Transport`](broker::Transport)
//! - [`OrderService`] tying it together

pub mod catalog;
pub mod error;
pub mod events;
pub mod order;
pub mod publisher;
pub mod repository;

pub use catalog::{InMemoryProductCatalog, Product, ProductCatalog};
pub use error::RepositoryError;
pub use events::OrderEventBuilder;
pub use order::{CreateOrder, Order, OrderError, OrderItem, OrderService, Result, UpdateOrderStatus};
pub use publisher::{EventPublisher, PublisherConfig};
pub use repository::{InMemoryOrderRepository, OrderRepository};
