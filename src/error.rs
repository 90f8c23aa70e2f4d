// src/error.rs
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Missing or invalid env var / CLI argument. Fatal before any network I/O.
    #[error("configuration error: {0}")]
    Config(String),

    /// Live-source transport or auth failure. Never retried internally.
    #[error("provider error ({provider}): {message}")]
    Provider {
        provider: &'static str,
        message: String,
    },

    /// No partition could be resolved, or the subscription could not be opened or kept alive.
    #[error("connection error: {0}")]
    Connection(String),

    #[error(transparent)]
    Parse(#[from] RecordParseError),

    /// Failure while releasing the receiver/connection.
    #[error("cleanup error: {0}")]
    Cleanup(String),
}

impl PipelineError {
    pub fn provider(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Provider {
            provider,
            message: message.into(),
        }
    }
}

/// A single record payload that could not be decoded into the expected shape.
/// Recovered locally by the verifier: the record is counted and skipped.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecordParseError {
    #[error("record has no payload body")]
    EmptyBody,
    #[error("payload is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("payload is missing field `{0}`")]
    MissingField(String),
    #[error("field `{field}` has unparseable value {value:?}")]
    BadValue { field: String, value: String },
}
