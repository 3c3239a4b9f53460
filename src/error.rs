//! Error types for tempmail.

use thiserror::Error;

/// Common error type for tempmail.
#[derive(Error, Debug)]
pub enum TempMailError {
    /// Registration against a domain that is not configured.
    #[error("invalid domain: {0}")]
    InvalidDomain(String),

    /// Operation against a mailbox that is unregistered, deactivated or expired.
    ///
    /// Clients should treat this as "generate a new address" rather than a hard failure.
    #[error("unknown mailbox: {0}")]
    UnknownMailbox(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// The backing key-value store is unreachable or timed out.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// No free generated address was found under a domain.
    #[error("no free address under {0}")]
    AddressExhausted(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Stored record could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for TempMailError {
    fn from(e: serde_json::Error) -> Self {
        TempMailError::Serialization(e.to_string())
    }
}

/// Result type alias for tempmail operations.
pub type Result<T> = std::result::Result<T, TempMailError>;
