//! Error types for the reputation engine.
//!
//! Pure calculators never return these: they clamp instead. Errors come from
//! configuration, storage adapters, and wallet activity sources. Expected
//! state conflicts (already checked in, already claimed) are not errors at
//! all; see [`crate::service::FailureReason`].

/// Reputation engine error types.
#[derive(Debug, thiserror::Error)]
pub enum ReputationError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("Wallet activity source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Timed out after {0} ms")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ReputationError {
    fn from(e: serde_json::Error) -> Self {
        ReputationError::SerializationError(e.to_string())
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, ReputationError>;
