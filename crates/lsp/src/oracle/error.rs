use alphabeta_api::ApiError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Protocol error: {0}")]
    Protocol(String),
    #[error("Server error {code}: {message}")]
    Server { code: i64, message: String },
    #[error("Request '{method}' timed out after {timeout:?}")]
    Timeout { method: String, timeout: Duration },
    #[error("Failed to start language server '{command}': {reason}")]
    Spawn { command: String, reason: String },
    #[error("Connection to language server closed")]
    Closed,
}

impl From<ClientError> for ApiError {
    fn from(err: ClientError) -> Self {
        ApiError::OracleUnavailable(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
