use super::language::SourceKind;
use super::position::{Position, Range};
use std::path::{Path, PathBuf};

/// Immutable snapshot of one document's text.
///
/// Offsets are UTF-8 byte offsets into `text`; positions use UTF-16 columns.
#[derive(Debug, Clone)]
pub struct Document {
    path: PathBuf,
    version: i32,
    text: String,
    line_starts: Vec<usize>,
}

impl Document {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>, version: i32) -> Self {
        let text = text.into();
        let line_starts = compute_line_starts(&text);
        Self {
            path: path.into(),
            version,
            text,
            line_starts,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    pub fn source_kind(&self) -> SourceKind {
        SourceKind::from_path(&self.path)
    }

    /// Convert a byte offset to a position. Offsets past the end clamp to the end
    /// and offsets inside a multibyte character snap back to its start.
    pub fn position_at(&self, offset: usize) -> Position {
        let mut offset = offset.min(self.text.len());
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }

        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let line_start = self.line_starts[line];
        let character: usize = self.text[line_start..offset]
            .chars()
            .map(char::len_utf16)
            .sum();

        Position::new(line as u32, character as u32)
    }

    /// Convert a position to a byte offset. Lines past the end map to the end of
    /// the text; columns past the end of a line stop before its terminator.
    pub fn offset_at(&self, position: Position) -> usize {
        let line = position.line as usize;
        let Some(&line_start) = self.line_starts.get(line) else {
            return self.text.len();
        };

        let mut offset = line_start;
        let mut utf16_count = 0usize;
        for c in self.text[line_start..].chars() {
            if utf16_count >= position.character as usize || c == '\n' || c == '\r' {
                break;
            }
            utf16_count += c.len_utf16();
            offset += c.len_utf8();
        }
        offset
    }

    /// Literal text spanned by `range`.
    pub fn text_in(&self, range: Range) -> &str {
        let start = self.offset_at(range.start);
        let end = self.offset_at(range.end);
        if start >= end {
            return "";
        }
        &self.text[start..end]
    }

    /// Range of the identifier that ends exactly at `position`.
    pub fn word_end_range(&self, position: Position) -> Option<Range> {
        let end = self.offset_at(position);
        let line_start = self.line_starts[self.position_at(end).line as usize];
        let is_ident = |c: char| c.is_alphanumeric() || c == '_' || c == '$';

        let start = self.text[line_start..end]
            .char_indices()
            .rev()
            .take_while(|(_, c)| is_ident(*c))
            .last()
            .map(|(i, _)| line_start + i)?;

        Some(Range::new(self.position_at(start), self.position_at(end)))
    }
}

fn compute_line_starts(text: &str) -> Vec<usize> {
    let mut starts = vec![0];
    starts.extend(
        text.bytes()
            .enumerate()
            .filter(|(_, b)| *b == b'\n')
            .map(|(i, _)| i + 1),
    );
    starts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> Document {
        Document::new("/tmp/sample.ts", text, 1)
    }

    #[test]
    fn position_and_offset_agree_on_ascii() {
        let d = doc("const a = 1;\nlet beta = a;\n");
        let pos = d.position_at(18);
        assert_eq!(pos, Position::new(1, 5));
        assert_eq!(d.offset_at(pos), 18);
    }

    #[test]
    fn columns_count_utf16_units() {
        // "é" is two UTF-8 bytes but one UTF-16 unit; the emoji is four bytes and two units.
        let d = doc("é😀x");
        assert_eq!(d.position_at(2), Position::new(0, 1));
        assert_eq!(d.position_at(6), Position::new(0, 3));
        assert_eq!(d.offset_at(Position::new(0, 3)), 6);
        assert_eq!(d.position_at(4), Position::new(0, 1));
    }

    #[test]
    fn crlf_terminators_are_not_columns() {
        let d = doc("ab\r\ncd");
        assert_eq!(d.line_count(), 2);
        assert_eq!(d.offset_at(Position::new(0, 10)), 2);
        assert_eq!(d.position_at(4), Position::new(1, 0));
    }

    #[test]
    fn out_of_range_positions_clamp() {
        let d = doc("one\ntwo");
        assert_eq!(d.offset_at(Position::new(9, 0)), 7);
        assert_eq!(d.position_at(100), Position::new(1, 3));
    }

    #[test]
    fn text_in_returns_literal_span() {
        let d = doc("import { legacyApi } from './x';");
        let range = Range::new(Position::new(0, 9), Position::new(0, 18));
        assert_eq!(d.text_in(range), "legacyApi");
        assert_eq!(d.text_in(Range::new(range.end, range.start)), "");
    }

    #[test]
    fn word_end_range_finds_identifier_before_position() {
        let d = doc("foo.$barBaz(1)");
        let range = d.word_end_range(Position::new(0, 11)).unwrap();
        assert_eq!(range, Range::new(Position::new(0, 4), Position::new(0, 11)));
        assert_eq!(d.text_in(range), "$barBaz");
        assert!(d.word_end_range(Position::new(0, 12)).is_none());
    }
}
