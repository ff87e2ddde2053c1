//! Error types for schema introspection.

use std::path::PathBuf;

/// Errors that can occur while reading schemas from a server or a file.
#[derive(Debug, thiserror::Error)]
pub enum IntrospectError {
    /// Database error while querying `INFORMATION_SCHEMA`.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The table does not exist (or has no visible columns).
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// `COLUMN_TYPE` could not be parsed.
    #[error("Malformed column type for '{column}': {column_type}")]
    MalformedColumnType {
        /// Column name.
        column: String,
        /// The raw `COLUMN_TYPE` text.
        column_type: String,
    },

    /// IO error reading a schema file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A schema or parameter file is not valid JSON for its shape.
    #[error("Failed to parse '{path}': {source}")]
    Parse {
        /// Path to the file.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },

    /// Inline JSON could not be parsed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for introspection operations.
pub type Result<T> = std::result::Result<T, IntrospectError>;
