//! Common error types for makerscope

use thiserror::Error;

/// Common result type for makerscope operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy shared by the catalog client, batch procedures and storage
#[derive(Error, Debug)]
pub enum Error {
    /// Transport failure reaching the catalog API
    #[error("Network error: {0}")]
    Network(String),

    /// Catalog API rejected the request (HTTP 400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Any other non-success status from the catalog API
    #[error("Unhandled API response: status {status}: {body}")]
    Unhandled { status: u16, body: String },

    /// Catalog item payload failed normalization
    #[error("Parse failure: {0}")]
    Parse(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
