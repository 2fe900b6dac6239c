use broker::HandlerError;
use event_contract::ContractError;
use thiserror::Error;

/// Errors raised while handling kitchen events.
#[derive(Debug, Error)]
pub enum KitchenError {
    /// The message broke the event contract; retrying cannot help.
    #[error("Invalid event contract: {0}")]
    InvalidContract(#[from] ContractError),

    /// The projection store failed.
    #[error("Kitchen store unavailable: {0}")]
    Store(String),
}

/// Result type for kitchen operations.
pub type Result<T> = std::result::Result<T, KitchenError>;

impl From<KitchenError> for HandlerError {
    fn from(e: KitchenError) -> Self {
        match e {
            KitchenError::InvalidContract(contract) => contract.into(),
            KitchenError::Store(reason) => HandlerError::Transient(reason),
        }
    }
}
