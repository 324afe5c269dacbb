pub mod annotation;
pub mod document;
pub mod language;
pub mod position;

pub use annotation::*;
pub use document::Document;
pub use language::SourceKind;
pub use position::{Position, Range};
