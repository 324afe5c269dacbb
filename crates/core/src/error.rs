use alphabeta_api::ApiError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AlphabetaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Parsing error: {0}")]
    Parsing(String),
    #[error("Oracle unavailable: {0}")]
    OracleUnavailable(String),
    #[error("Scan of {} failed: {reason}", path.display())]
    ScanFailed { path: PathBuf, reason: String },
    #[error("Subscriber failed: {0}")]
    SubscriberFailed(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AlphabetaError {
    pub fn scan_failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        AlphabetaError::ScanFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AlphabetaError>;
