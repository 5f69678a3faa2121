//! Query error types.

use domain::{DomainError, ValidationError};
use ledger::LedgerError;
use thiserror::Error;

/// Errors that can occur while answering a query.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The query input was rejected before reaching the ledger.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A domain-level failure, such as a missing ticket.
    #[error(transparent)]
    Domain(DomainError),

    /// The ledger could not run the query.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

impl From<DomainError> for QueryError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(e) => QueryError::Validation(e),
            DomainError::Ledger(e) => QueryError::Ledger(e),
            other => QueryError::Domain(other),
        }
    }
}

/// Result type for query operations.
pub type Result<T> = std::result::Result<T, QueryError>;
