use thiserror::Error;

use crate::Version;

/// Errors that can occur when interacting with the ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A key read by the batch was changed by another commit before this one.
    #[error(
        "Commit conflict on key {key}: read version {}, current version {}",
        display_version(.expected),
        display_version(.actual)
    )]
    Conflict {
        key: String,
        expected: Option<Version>,
        actual: Option<Version>,
    },

    /// The rich query could not be parsed.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// The write batch is not acceptable.
    #[error("Invalid batch: {0}")]
    InvalidBatch(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn display_version(version: &Option<Version>) -> String {
    version.map_or_else(|| "absent".to_string(), |v| v.to_string())
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
