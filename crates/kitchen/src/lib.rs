//! Kitchen consumer.
//!
//! Listens for `order.placed`, validates the contract and keeps a local
//! projection of every order the kitchen is preparing.

pub mod error;
pub mod listener;
pub mod projection;
pub mod service;
pub mod store;

pub use error::{KitchenError, Result};
pub use listener::OrderPlacedListener;
pub use projection::KitchenOrder;
pub use service::{KitchenService, StartPreparation};
pub use store::{InMemoryKitchenStore, KitchenOrderStore};
