//! Application configuration loaded from environment variables.

use std::time::Duration;

use broker::{ConsumerGroupConfig, ExchangeKind, RetryPolicy, WorkQueueConfig};
use domain::PublisherConfig;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Broker identifiers shared by the producer and both consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerConfig {
    pub exchange: String,
    pub placed_routing_key: String,
    pub ready_routing_key: String,
    pub kitchen_queue: String,
    pub kitchen_dlx: String,
    pub kitchen_dlq: String,
    pub report_placed_queue: String,
    pub report_ready_queue: String,
    pub report_dlx: String,
    pub report_dlq: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            exchange: "order.exchange".to_string(),
            placed_routing_key: "order.placed".to_string(),
            ready_routing_key: "order.ready".to_string(),
            kitchen_queue: "kitchen.order.placed".to_string(),
            kitchen_dlx: "kitchen.dlx".to_string(),
            kitchen_dlq: "kitchen.order.placed.dlq".to_string(),
            report_placed_queue: "report.order.placed".to_string(),
            report_ready_queue: "report.order.ready".to_string(),
            report_dlx: "report.dlx".to_string(),
            report_dlq: "report.order.dlq".to_string(),
        }
    }
}

impl BrokerConfig {
    pub fn publisher(&self) -> PublisherConfig {
        PublisherConfig {
            exchange: self.exchange.clone(),
            placed_routing_key: self.placed_routing_key.clone(),
            ready_routing_key: self.ready_routing_key.clone(),
        }
    }

    /// Kitchen: one queue on the placed key, topic DLX, `<key>.failed` on dead-letter.
    pub fn kitchen_group(&self) -> ConsumerGroupConfig {
        ConsumerGroupConfig {
            exchange: self.exchange.clone(),
            dead_letter_exchange: self.kitchen_dlx.clone(),
            dead_letter_exchange_kind: ExchangeKind::Topic,
            dead_letter_queue: self.kitchen_dlq.clone(),
            work_queues: vec![WorkQueueConfig {
                queue: self.kitchen_queue.clone(),
                binding_key: self.placed_routing_key.clone(),
                dead_letter_routing_key: format!("{}.failed", self.placed_routing_key),
            }],
        }
    }

    /// Report: placed and ready queues sharing a direct DLX and one DLQ.
    pub fn report_group(&self) -> ConsumerGroupConfig {
        ConsumerGroupConfig {
            exchange: self.exchange.clone(),
            dead_letter_exchange: self.report_dlx.clone(),
            dead_letter_exchange_kind: ExchangeKind::Direct,
            dead_letter_queue: self.report_dlq.clone(),
            work_queues: vec![
                WorkQueueConfig {
                    queue: self.report_placed_queue.clone(),
                    binding_key: self.placed_routing_key.clone(),
                    dead_letter_routing_key: self.placed_routing_key.clone(),
                },
                WorkQueueConfig {
                    queue: self.report_ready_queue.clone(),
                    binding_key: self.ready_routing_key.clone(),
                    dead_letter_routing_key: self.ready_routing_key.clone(),
                },
            ],
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`, `PORT`, `RUST_LOG`, `LOG_FORMAT` (`text` | `json`)
/// - `BROKER_EXCHANGE`, `ROUTING_KEY_ORDER_PLACED`, `ROUTING_KEY_ORDER_READY`
/// - `KITCHEN_QUEUE`, `KITCHEN_DLX`, `KITCHEN_DLQ`
/// - `REPORT_PLACED_QUEUE`, `REPORT_READY_QUEUE`, `REPORT_DLX`, `REPORT_DLQ`
/// - `RETRY_MAX_ATTEMPTS`, `RETRY_INITIAL_INTERVAL_MS`, `RETRY_MULTIPLIER`,
///   `RETRY_MAX_INTERVAL_MS`
///
/// Unset or unparsable values fall back to the defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub broker: BrokerConfig,
    pub retry: RetryPolicy,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let string = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        let broker = BrokerConfig {
            exchange: string("BROKER_EXCHANGE", &defaults.broker.exchange),
            placed_routing_key: string("ROUTING_KEY_ORDER_PLACED", &defaults.broker.placed_routing_key),
            ready_routing_key: string("ROUTING_KEY_ORDER_READY", &defaults.broker.ready_routing_key),
            kitchen_queue: string("KITCHEN_QUEUE", &defaults.broker.kitchen_queue),
            kitchen_dlx: string("KITCHEN_DLX", &defaults.broker.kitchen_dlx),
            kitchen_dlq: string("KITCHEN_DLQ", &defaults.broker.kitchen_dlq),
            report_placed_queue: string("REPORT_PLACED_QUEUE", &defaults.broker.report_placed_queue),
            report_ready_queue: string("REPORT_READY_QUEUE", &defaults.broker.report_ready_queue),
            report_dlx: string("REPORT_DLX", &defaults.broker.report_dlx),
            report_dlq: string("REPORT_DLQ", &defaults.broker.report_dlq),
        };

        let retry = RetryPolicy {
            max_attempts: parsed("RETRY_MAX_ATTEMPTS")
                .and_then(|n| u32::try_from(n).ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.retry.max_attempts),
            initial_interval: parsed("RETRY_INITIAL_INTERVAL_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry.initial_interval),
            multiplier: lookup("RETRY_MULTIPLIER")
                .and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|m| m.is_finite() && *m >= 1.0)
                .unwrap_or(defaults.retry.multiplier),
            max_interval: parsed("RETRY_MAX_INTERVAL_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry.max_interval),
        };

        Self {
            host: string("HOST", &defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: string("RUST_LOG", &defaults.log_level),
            log_format: match lookup("LOG_FORMAT").as_deref() {
                Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
                _ => LogFormat::Text,
            },
            broker,
            retry,
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            broker: BrokerConfig::default(),
            retry: RetryPolicy::default(),
        }
    }
}
