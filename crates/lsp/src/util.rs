use alphabeta_api::{Document, Position, Range};
use std::path::PathBuf;
use tower_lsp::lsp_types::{self, TextDocumentContentChangeEvent, Url};

pub fn uri_to_path(uri: &Url) -> Option<PathBuf> {
    uri.to_file_path().ok()
}

pub fn to_lsp_position(position: Position) -> lsp_types::Position {
    lsp_types::Position::new(position.line, position.character)
}

pub fn from_lsp_position(position: lsp_types::Position) -> Position {
    Position::new(position.line, position.character)
}

pub fn to_lsp_range(range: Range) -> lsp_types::Range {
    lsp_types::Range::new(to_lsp_position(range.start), to_lsp_position(range.end))
}

pub fn from_lsp_range(range: lsp_types::Range) -> Range {
    Range::new(from_lsp_position(range.start), from_lsp_position(range.end))
}

/// Apply `didChange` edits in order. Ranged edits are resolved against the text
/// as it stands after the previous edit.
pub fn apply_changes(document: &Document, changes: &[TextDocumentContentChangeEvent], version: i32) -> Document {
    let mut current = Document::new(document.path(), document.text(), version);
    for change in changes {
        let text = match change.range {
            None => change.text.clone(),
            Some(range) => {
                let start = current.offset_at(from_lsp_position(range.start));
                let end = current.offset_at(from_lsp_position(range.end)).max(start);
                let mut text = current.text().to_string();
                text.replace_range(start..end, &change.text);
                text
            }
        };
        current = Document::new(document.path(), text, version);
    }
    current
}
