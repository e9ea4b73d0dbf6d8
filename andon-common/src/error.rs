//! Common error types for the andon services

use thiserror::Error;

/// Common result type for andon operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across andon services
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Source data could not be interpreted (bad document, out-of-range column)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
