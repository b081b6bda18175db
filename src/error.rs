//! Error types shared across the crate.

use thiserror::Error;

/// Error reported by a health-data store through a query handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StoreError {
    pub message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failure of a bridged query or authorization request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The platform health-data service cannot be reached on this device.
    #[error("health data is not available on this device")]
    Unavailable,
    /// The store reported an error, or returned neither a result nor an error.
    #[error("query failed: {message}")]
    Failed { message: String },
    /// The store released the request without ever completing it.
    #[error("query was abandoned before it completed")]
    Abandoned,
}

impl QueryError {
    pub fn failed(message: impl Into<String>) -> Self {
        QueryError::Failed {
            message: message.into(),
        }
    }
}

impl From<StoreError> for QueryError {
    fn from(err: StoreError) -> Self {
        QueryError::Failed {
            message: err.message,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Serialize error: {0}")]
    SerializeError(String),
    #[error("missing data kind identifier for `{0}`")]
    MissingDataKind(&'static str),
    #[error("unknown data kind identifier `{0}`")]
    UnknownDataKind(String),
    #[error("unknown timezone `{0}`")]
    InvalidTimezone(String),
    #[error("lookback must cover at least one day, got {0}")]
    InvalidLookback(u32),
    #[error("invalid timestamp format `{0}`")]
    InvalidTimestampFormat(String),
}
