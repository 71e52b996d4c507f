use crate::config::ConfigError;
use std::io;
use thiserror::Error;
use tokio::task::JoinError;

#[derive(Debug, Error, Clone)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("HTTP error: {0}")]
    Reqwest(String),

    #[error("HTTP error for url {0}: {1} {2}")]
    HttpStatus(String, u16, String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("Probe error: {0}")]
    Probe(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid hash: {0}")]
    InvalidHash(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("all attempts are spent (count={0})")]
    AttemptsExhausted(u32),

    #[error("Ingest service is stopped")]
    ServiceStopped,

    #[error("Task join error: {0}")]
    JoinError(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl From<sqlx::Error> for IngestError {
    fn from(err: sqlx::Error) -> Self {
        IngestError::Storage(err.to_string())
    }
}

impl From<io::Error> for IngestError {
    fn from(err: io::Error) -> Self {
        IngestError::Io(err.to_string())
    }
}

impl From<reqwest::Error> for IngestError {
    fn from(err: reqwest::Error) -> Self {
        IngestError::Reqwest(err.to_string())
    }
}

impl From<JoinError> for IngestError {
    fn from(err: JoinError) -> Self {
        IngestError::JoinError(err.to_string())
    }
}

impl From<ConfigError> for IngestError {
    fn from(err: ConfigError) -> Self {
        IngestError::ConfigError(err.to_string())
    }
}

impl From<serde_json::Error> for IngestError {
    fn from(err: serde_json::Error) -> Self {
        IngestError::Other(err.to_string())
    }
}

impl From<url::ParseError> for IngestError {
    fn from(err: url::ParseError) -> Self {
        IngestError::InvalidUrl(err.to_string())
    }
}
