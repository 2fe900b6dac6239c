use thiserror::Error;

/// Errors raised by a transport when publishing or declaring topology.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The target exchange was never declared.
    #[error("Unknown exchange: {0}")]
    UnknownExchange(String),

    /// The target queue was never declared.
    #[error("Unknown queue: {0}")]
    UnknownQueue(String),

    /// The broker refused or could not take the message.
    #[error("Broker unavailable: {0}")]
    Unavailable(String),
}

/// Outcome of a failed message handler, classified for the broker.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Permanent failure: reject without requeue, straight to the DLQ.
    #[error("Rejected: {0}")]
    Reject(String),

    /// Recoverable failure: retry with backoff, DLQ once retries run out.
    #[error("Transient failure: {0}")]
    Transient(String),
}

impl HandlerError {
    /// Returns true if retrying cannot help.
    pub fn is_permanent(&self) -> bool {
        matches!(self, HandlerError::Reject(_))
    }
}

impl From<event_contract::ContractError> for HandlerError {
    fn from(e: event_contract::ContractError) -> Self {
        HandlerError::Reject(e.to_string())
    }
}
