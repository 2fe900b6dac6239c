//! Message broker plumbing shared by the producer and both consumers.
//!
//! - [`Topology`] declares the topic exchange, work queues, dead-letter
//!   exchanges and dead-letter queues
//! - [`RetryPolicy`] is the bounded exponential backoff applied to transient
//!   handler failures
//! - [`Transport`] is the outbound port the producer publishes through
//! - [`InMemoryBroker`] routes messages with AMQP topic semantics and
//!   dead-letters what the listeners give up on
//! - [`ListenerContainer`] drives a [`MessageHandler`] over one queue

pub mod error;
pub mod listener;
pub mod memory;
pub mod message;
pub mod retry;
pub mod topology;
pub mod transport;

pub use error::{HandlerError, TransportError};
pub use listener::{
    DeliveryOutcome, DrainReport, ListenerContainer, MessageHandler, REASON_REJECTED,
    REASON_RETRIES_EXHAUSTED,
};
pub use memory::{EXCEPTION_MESSAGE_HEADER, InMemoryBroker};
pub use message::{Delivery, Headers, Message};
pub use retry::RetryPolicy;
pub use topology::{
    Binding, ConsumerGroupConfig, Exchange, ExchangeKind, QueueSpec, Topology, WorkQueueConfig,
};
pub use transport::Transport;

/// Queue argument naming the exchange a rejected message is republished to.
pub const DEAD_LETTER_EXCHANGE_ARG: &str = "x-dead-letter-exchange";

/// Queue argument naming the routing key used when dead-lettering.
pub const DEAD_LETTER_ROUTING_KEY_ARG: &str = "x-dead-letter-routing-key";

/// Header recording why a message was dead-lettered.
pub const DEATH_REASON_HEADER: &str = "x-death-reason";

/// Header recording the queue a dead-lettered message came from.
pub const ORIGINAL_QUEUE_HEADER: &str = "x-original-queue";

/// Header recording the routing key a dead-lettered message was published with.
pub const ORIGINAL_ROUTING_KEY_HEADER: &str = "x-original-routing-key";
