//! Read-only views over an annotation index snapshot.
//!
//! These are pure functions of `(index, config)`; hosts render them however
//! they like (status bar item, tree view, text decorations, terminal output).

pub mod decorations;
pub mod status;
pub mod tree;

pub use decorations::{DecorationPlan, DecorationStyle};
pub use status::StatusCounter;
pub use tree::{AnnotationTree, FileNode, LineItem, PhaseNode};
