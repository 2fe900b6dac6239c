//! Exchange, queue and binding declarations.
//!
//! Each consumer group owns its work queues, a dead-letter exchange and one
//! dead-letter queue. Work queues carry `x-dead-letter-exchange` and
//! `x-dead-letter-routing-key` arguments so rejected messages land in the
//! group's DLQ.

use std::collections::BTreeMap;

use crate::{DEAD_LETTER_EXCHANGE_ARG, DEAD_LETTER_ROUTING_KEY_ARG};

/// Exchange routing semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeKind {
    /// Binding key must equal the routing key.
    Direct,
    /// Binding key is a pattern where `*` matches one word and `#` matches
    /// zero or more words.
    Topic,
}

impl ExchangeKind {
    /// Returns true if `routing_key` is routed by a binding with `binding_key`.
    pub fn routes(&self, binding_key: &str, routing_key: &str) -> bool {
        match self {
            ExchangeKind::Direct => binding_key == routing_key,
            ExchangeKind::Topic => {
                let pattern: Vec<&str> = binding_key.split('.').collect();
                let words: Vec<&str> = routing_key.split('.').collect();
                topic_matches(&pattern, &words)
            }
        }
    }
}

fn topic_matches(pattern: &[&str], words: &[&str]) -> bool {
    match pattern.split_first() {
        None => words.is_empty(),
        Some((&"#", rest)) => (0..=words.len()).any(|skip| topic_matches(rest, &words[skip..])),
        Some((&head, rest)) => match words.split_first() {
            Some((&word, remaining)) if head == "*" || head == word => {
                topic_matches(rest, remaining)
            }
            _ => false,
        },
    }
}

/// A declared exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub name: String,
    pub kind: ExchangeKind,
}

/// A declared durable queue with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueSpec {
    pub name: String,
    pub arguments: BTreeMap<String, String>,
}

impl QueueSpec {
    /// A queue without dead-lettering.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: BTreeMap::new(),
        }
    }

    /// Routes rejected messages to `exchange` using `routing_key`.
    pub fn with_dead_letter(mut self, exchange: impl Into<String>, routing_key: impl Into<String>) -> Self {
        self.arguments
            .insert(DEAD_LETTER_EXCHANGE_ARG.to_string(), exchange.into());
        self.arguments
            .insert(DEAD_LETTER_ROUTING_KEY_ARG.to_string(), routing_key.into());
        self
    }

    pub fn dead_letter_exchange(&self) -> Option<&str> {
        self.arguments.get(DEAD_LETTER_EXCHANGE_ARG).map(String::as_str)
    }

    pub fn dead_letter_routing_key(&self) -> Option<&str> {
        self.arguments
            .get(DEAD_LETTER_ROUTING_KEY_ARG)
            .map(String::as_str)
    }
}

/// Binds a queue to an exchange under a binding key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub exchange: String,
    pub queue: String,
    pub binding_key: String,
}

/// A set of declarations applied to a broker in one go.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topology {
    pub exchanges: Vec<Exchange>,
    pub queues: Vec<QueueSpec>,
    pub bindings: Vec<Binding>,
}

/// One work queue of a consumer group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkQueueConfig {
    pub queue: String,
    /// Key the queue is bound to on the main exchange.
    pub binding_key: String,
    /// Key used when a message from this queue is dead-lettered.
    pub dead_letter_routing_key: String,
}

/// Everything a consumer group declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerGroupConfig {
    pub exchange: String,
    pub dead_letter_exchange: String,
    pub dead_letter_exchange_kind: ExchangeKind,
    pub dead_letter_queue: String,
    pub work_queues: Vec<WorkQueueConfig>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exchange(mut self, name: impl Into<String>, kind: ExchangeKind) -> Self {
        self.exchanges.push(Exchange {
            name: name.into(),
            kind,
        });
        self
    }

    pub fn queue(mut self, spec: QueueSpec) -> Self {
        self.queues.push(spec);
        self
    }

    pub fn bind(
        mut self,
        exchange: impl Into<String>,
        queue: impl Into<String>,
        binding_key: impl Into<String>,
    ) -> Self {
        let binding = Binding {
            exchange: exchange.into(),
            queue: queue.into(),
            binding_key: binding_key.into(),
        };
        if !self.bindings.contains(&binding) {
            self.bindings.push(binding);
        }
        self
    }

    /// The producer only needs the main topic exchange.
    pub fn producer(exchange: impl Into<String>) -> Self {
        Self::new().exchange(exchange, ExchangeKind::Topic)
    }

    /// Declares a consumer group: main exchange, DLX, DLQ and work queues.
    ///
    /// The DLQ is bound to the DLX once per distinct dead-letter routing key.
    pub fn consumer_group(config: &ConsumerGroupConfig) -> Self {
        let mut topology = Self::producer(config.exchange.clone())
            .exchange(
                config.dead_letter_exchange.clone(),
                config.dead_letter_exchange_kind,
            )
            .queue(QueueSpec::new(config.dead_letter_queue.clone()));

        for work in &config.work_queues {
            topology = topology
                .queue(
                    QueueSpec::new(work.queue.clone()).with_dead_letter(
                        config.dead_letter_exchange.clone(),
                        work.dead_letter_routing_key.clone(),
                    ),
                )
                .bind(
                    config.exchange.clone(),
                    work.queue.clone(),
                    work.binding_key.clone(),
                )
                .bind(
                    config.dead_letter_exchange.clone(),
                    config.dead_letter_queue.clone(),
                    work.dead_letter_routing_key.clone(),
                );
        }
        topology
    }
}
