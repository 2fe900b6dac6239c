use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{Notify, RwLock};

use crate::error::TransportError;
use crate::message::{Delivery, Message};
use crate::topology::{Binding, ExchangeKind, QueueSpec, Topology};
use crate::transport::Transport;
use crate::{DEATH_REASON_HEADER, ORIGINAL_QUEUE_HEADER, ORIGINAL_ROUTING_KEY_HEADER};

/// Header carrying the failure description of a dead-lettered message.
pub const EXCEPTION_MESSAGE_HEADER: &str = "x-exception-message";

struct QueueState {
    spec: QueueSpec,
    messages: VecDeque<Delivery>,
    notify: Arc<Notify>,
}

#[derive(Default)]
struct BrokerState {
    exchanges: HashMap<String, ExchangeKind>,
    queues: HashMap<String, QueueState>,
    bindings: Vec<Binding>,
}

impl BrokerState {
    /// Delivers to every bound queue whose binding key matches. Returns the
    /// number of queues the message reached.
    fn route(
        &mut self,
        exchange: &str,
        routing_key: &str,
        message: &Message,
    ) -> Result<usize, TransportError> {
        let kind = *self
            .exchanges
            .get(exchange)
            .ok_or_else(|| TransportError::UnknownExchange(exchange.to_string()))?;

        let targets: Vec<String> = self
            .bindings
            .iter()
            .filter(|b| b.exchange == exchange && kind.routes(&b.binding_key, routing_key))
            .map(|b| b.queue.clone())
            .collect();

        let mut delivered = 0;
        for queue in targets {
            if let Some(state) = self.queues.get_mut(&queue) {
                state.messages.push_back(Delivery {
                    queue: queue.clone(),
                    exchange: exchange.to_string(),
                    routing_key: routing_key.to_string(),
                    message: message.clone(),
                });
                state.notify.notify_one();
                delivered += 1;
            }
        }
        Ok(delivered)
    }
}

/// In-memory broker with AMQP-style exchanges, bindings and dead-lettering.
///
/// Cloning is cheap and every clone shares the same state, so the producer
/// and all listeners can hold their own handle.
#[derive(Clone, Default)]
pub struct InMemoryBroker {
    state: Arc<RwLock<BrokerState>>,
    fail_on_publish: Arc<AtomicBool>,
}

impl InMemoryBroker {
    /// Creates a broker with nothing declared.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent publish fail, simulating an unreachable broker.
    pub fn set_fail_on_publish(&self, fail: bool) {
        self.fail_on_publish.store(fail, Ordering::SeqCst);
    }

    /// Applies declarations. Redeclaring an existing queue keeps its messages.
    pub async fn declare(&self, topology: &Topology) {
        let mut state = self.state.write().await;
        for exchange in &topology.exchanges {
            state
                .exchanges
                .entry(exchange.name.clone())
                .or_insert(exchange.kind);
        }
        for spec in &topology.queues {
            state
                .queues
                .entry(spec.name.clone())
                .or_insert_with(|| QueueState {
                    spec: spec.clone(),
                    messages: VecDeque::new(),
                    notify: Arc::new(Notify::new()),
                });
        }
        for binding in &topology.bindings {
            if !state.bindings.contains(binding) {
                state.bindings.push(binding.clone());
            }
        }
        tracing::debug!(
            exchanges = topology.exchanges.len(),
            queues = topology.queues.len(),
            bindings = topology.bindings.len(),
            "Declared topology"
        );
    }

    /// Pops the next message from a queue without waiting.
    pub async fn try_next(&self, queue: &str) -> Result<Option<Delivery>, TransportError> {
        let mut state = self.state.write().await;
        let queue_state = state
            .queues
            .get_mut(queue)
            .ok_or_else(|| TransportError::UnknownQueue(queue.to_string()))?;
        Ok(queue_state.messages.pop_front())
    }

    /// Waits until a message is available on a queue and pops it.
    pub async fn next_delivery(&self, queue: &str) -> Result<Delivery, TransportError> {
        let notify = {
            let state = self.state.read().await;
            state
                .queues
                .get(queue)
                .map(|q| q.notify.clone())
                .ok_or_else(|| TransportError::UnknownQueue(queue.to_string()))?
        };
        loop {
            if let Some(delivery) = self.try_next(queue).await? {
                return Ok(delivery);
            }
            notify.notified().await;
        }
    }

    /// Republishes a delivery to its queue's dead-letter exchange.
    ///
    /// Adds `x-death-reason`, `x-original-queue`, `x-original-routing-key` and
    /// `x-exception-message` headers. Uses the queue's dead-letter routing key
    /// when set, otherwise the original routing key. A queue without a
    /// dead-letter exchange drops the message.
    pub async fn dead_letter(
        &self,
        delivery: Delivery,
        reason: &str,
        detail: &str,
    ) -> Result<(), TransportError> {
        let mut state = self.state.write().await;
        let spec = state
            .queues
            .get(&delivery.queue)
            .map(|q| q.spec.clone())
            .ok_or_else(|| TransportError::UnknownQueue(delivery.queue.clone()))?;

        let Some(exchange) = spec.dead_letter_exchange() else {
            tracing::warn!(queue = %delivery.queue, reason, "Dropping message: queue has no dead-letter exchange");
            return Ok(());
        };
        let routing_key = spec
            .dead_letter_routing_key()
            .unwrap_or(&delivery.routing_key);

        let message = delivery
            .message
            .with_header(DEATH_REASON_HEADER, reason)
            .with_header(ORIGINAL_QUEUE_HEADER, delivery.queue.as_str())
            .with_header(ORIGINAL_ROUTING_KEY_HEADER, delivery.routing_key.as_str())
            .with_header(EXCEPTION_MESSAGE_HEADER, detail);

        let delivered = state.route(exchange, routing_key, &message)?;
        if delivered == 0 {
            tracing::warn!(
                queue = %delivery.queue,
                exchange,
                routing_key,
                "Dead-lettered message was unroutable"
            );
        }
        Ok(())
    }

    /// Puts a delivery back at the tail of its queue.
    pub async fn requeue(&self, delivery: Delivery) -> Result<(), TransportError> {
        let mut state = self.state.write().await;
        let queue_state = state
            .queues
            .get_mut(&delivery.queue)
            .ok_or_else(|| TransportError::UnknownQueue(delivery.queue.clone()))?;
        queue_state.messages.push_back(delivery);
        queue_state.notify.notify_one();
        Ok(())
    }

    /// Returns a snapshot of the messages waiting on a queue.
    pub async fn messages(&self, queue: &str) -> Result<Vec<Delivery>, TransportError> {
        let state = self.state.read().await;
        state
            .queues
            .get(queue)
            .map(|q| q.messages.iter().cloned().collect())
            .ok_or_else(|| TransportError::UnknownQueue(queue.to_string()))
    }

    /// Returns the number of messages waiting on a queue.
    pub async fn depth(&self, queue: &str) -> Result<usize, TransportError> {
        let state = self.state.read().await;
        state
            .queues
            .get(queue)
            .map(|q| q.messages.len())
            .ok_or_else(|| TransportError::UnknownQueue(queue.to_string()))
    }

    /// Removes every message from a queue, returning how many were dropped.
    pub async fn purge(&self, queue: &str) -> Result<usize, TransportError> {
        let mut state = self.state.write().await;
        let queue_state = state
            .queues
            .get_mut(queue)
            .ok_or_else(|| TransportError::UnknownQueue(queue.to_string()))?;
        let count = queue_state.messages.len();
        queue_state.messages.clear();
        Ok(count)
    }
}

#[async_trait]
impl Transport for InMemoryBroker {
    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        message: Message,
    ) -> Result<(), TransportError> {
        if self.fail_on_publish.load(Ordering::SeqCst) {
            return Err(TransportError::Unavailable(
                "simulated broker outage".to_string(),
            ));
        }

        let delivered = self
            .state
            .write()
            .await
            .route(exchange, routing_key, &message)?;
        tracing::debug!(exchange, routing_key, delivered, "Published message");
        Ok(())
    }
}
