//! Report error types.

use broker::HandlerError;
use event_contract::ContractError;
use thiserror::Error;

/// Errors that can occur in the report consumer.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The message broke the event contract.
    #[error("Invalid event contract: {0}")]
    InvalidContract(#[from] ContractError),

    /// The projection store failed.
    #[error("Report store unavailable: {0}")]
    Store(String),

    /// A report was requested for an unusable date range.
    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),
}

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;

impl From<ReportError> for HandlerError {
    fn from(e: ReportError) -> Self {
        match e {
            ReportError::InvalidContract(contract) => contract.into(),
            ReportError::Store(reason) => HandlerError::Transient(reason),
            other => HandlerError::Reject(other.to_string()),
        }
    }
}
