//! Persistence error shared by the catalog and repository ports.

use thiserror::Error;

/// Errors raised by a store adapter.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The store could not be reached or refused the operation.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}
