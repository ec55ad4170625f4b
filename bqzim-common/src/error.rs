//! Common error types for BQ Zim

use thiserror::Error;

/// Common result type for BQ Zim operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors shared by the store, configuration and startup code
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

    /// A unique column already holds this value
    ///
    /// `field` is the column name ("username" or "email").
    #[error("Duplicate {field}")]
    Duplicate { field: String },

    /// Internal error (e.g. a blocking task panicked)
    #[error("Internal error: {0}")]
    Internal(String),
}
