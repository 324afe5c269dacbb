#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Oracle unavailable: {0}")]
    OracleUnavailable(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Unsupported: {0}")]
    Unsupported(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
