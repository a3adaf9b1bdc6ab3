//! Common error types for festsync

use thiserror::Error;

/// Common result type for festsync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised below the reconciliation engine (storage, config, I/O)
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A stored row could not be turned back into a record
    #[error("Decode error: {0}")]
    Decode(String),

    /// The store has no table for the requested entity kind
    #[error("Unsupported entity kind: {0}")]
    UnsupportedKind(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
