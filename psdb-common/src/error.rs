//! Common error types for PSDB

use thiserror::Error;

/// Common result type for PSDB operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across PSDB services
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored or submitted JSON could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Wrap an error with a human-readable context prefix.
    ///
    /// Not-found and invalid-input errors keep their class so callers can
    /// still map them to the right response.
    pub fn context(self, context: &str) -> Self {
        match self {
            Error::NotFound(msg) => Error::NotFound(msg),
            Error::InvalidInput(msg) => Error::InvalidInput(msg),
            other => Error::Internal(format!("{}: {}", context, other)),
        }
    }
}
