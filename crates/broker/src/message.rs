use std::collections::BTreeMap;

/// Message headers (AMQP header table).
pub type Headers = BTreeMap<String, serde_json::Value>;

/// An outbound or queued message: headers plus an opaque body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl Message {
    /// Creates a message with no headers.
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            headers: Headers::new(),
            body: body.into(),
        }
    }

    /// Adds a header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Returns a header value as a string, if present and a string.
    pub fn header_str(&self, key: &str) -> Option<&str> {
        self.headers.get(key).and_then(|v| v.as_str())
    }
}

/// A message as handed to a consumer.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Queue the message was delivered from.
    pub queue: String,
    /// Exchange the message was published to.
    pub exchange: String,
    /// Routing key the message was published with.
    pub routing_key: String,
    pub message: Message,
}
