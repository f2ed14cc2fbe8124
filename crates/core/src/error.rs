use thiserror::Error;

use crate::service::ServiceError;

/// Errors raised while translating, validating or reconciling table schemas.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unknown table: {table_name}")]
    UnknownTable { table_name: String },

    #[error("Schema error: {0}")]
    Schema(String),

    #[error(
        "Primary schema of table '{table_name}' has diverged. Declared: {declared}. Remote: {remote}"
    )]
    SchemaMismatch {
        table_name: String,
        declared: String,
        remote: String,
    },

    #[error("Table '{table_name}' already exists: {message}")]
    TableAlreadyExists { table_name: String, message: String },

    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl SyncError {
    /// Shorthand for `SyncError::UnknownTable`.
    pub fn unknown_table(table_name: impl Into<String>) -> Self {
        Self::UnknownTable {
            table_name: table_name.into(),
        }
    }
}

/// Result type for tablesync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
