use broker::TransportError;
use thiserror::Error;

/// Failures while running the hosted listeners.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Listener on {queue} failed: {source}")]
    Listener {
        queue: String,
        #[source]
        source: TransportError,
    },

    #[error("Listener task on {queue} panicked or was cancelled")]
    ListenerTask { queue: String },
}

pub type Result<T> = std::result::Result<T, AppError>;
