pub mod error;
pub mod host;
pub mod models;
pub mod oracle;

pub use error::{ApiError, ApiResult};
pub use host::DocumentHost;
pub use models::*;
pub use oracle::HoverOracle;
