//! Identifier extraction.
//!
//! Parses a document with the error-tolerant tree-sitter TypeScript grammars and
//! yields the position just past every identifier token, in pre-order.

use crate::error::{AlphabetaError, Result};
use alphabeta_api::{Document, Position, SourceKind};
use tree_sitter::{Language, Node, Parser, Tree};

/// Node kinds treated as identifier tokens.
pub const IDENTIFIER_KINDS: &[&str] = &[
    "identifier",
    "property_identifier",
    "type_identifier",
    "shorthand_property_identifier",
    "shorthand_property_identifier_pattern",
    "statement_identifier",
];

#[derive(Clone)]
pub struct IdentifierExtractor {
    typescript: Language,
    tsx: Language,
}

impl Default for IdentifierExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentifierExtractor {
    pub fn new() -> Self {
        Self {
            typescript: tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            tsx: tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }

    fn language(&self, kind: SourceKind) -> &Language {
        match kind {
            SourceKind::TypeScript => &self.typescript,
            SourceKind::Tsx => &self.tsx,
        }
    }

    pub fn parse(&self, document: &Document) -> Result<Tree> {
        // Parser is not Sync; a fresh one per call keeps extraction reentrant.
        let mut parser = Parser::new();
        parser
            .set_language(self.language(document.source_kind()))
            .map_err(|e| AlphabetaError::Parsing(format!("failed to load grammar: {}", e)))?;
        parser.parse(document.text(), None).ok_or_else(|| {
            AlphabetaError::Parsing(format!("parser produced no tree for {}", document.path().display()))
        })
    }

    /// Positions immediately after each identifier, in tree order. Syntax errors
    /// are recovered: whatever identifiers the parser salvaged are returned.
    pub fn extract(&self, document: &Document) -> Result<Vec<Position>> {
        let tree = self.parse(document)?;
        let root = tree.root_node();
        if root.has_error() {
            tracing::debug!(
                path = %document.path().display(),
                "syntax errors present; using recovered identifiers"
            );
        }

        let mut positions = Vec::new();
        let mut cursor = root.walk();
        loop {
            let node = cursor.node();
            if is_identifier(&node) {
                positions.push(document.position_at(node.end_byte()));
            }

            if cursor.goto_first_child() {
                continue;
            }
            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    return Ok(positions);
                }
            }
        }
    }
}

fn is_identifier(node: &Node) -> bool {
    // Missing nodes are zero-width tokens the parser invented during recovery
    !node.is_missing() && IDENTIFIER_KINDS.contains(&node.kind())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(path: &str, text: &str) -> Vec<Position> {
        IdentifierExtractor::new()
            .extract(&Document::new(path, text, 1))
            .unwrap()
    }

    fn on_line(line: u32, cols: &[u32]) -> Vec<Position> {
        cols.iter().map(|c| Position::new(line, *c)).collect()
    }

    #[test]
    fn emits_end_of_each_identifier() {
        let positions = extract("/a.ts", "const alpha = beta.gamma;");
        assert_eq!(positions, on_line(0, &[11, 18, 24]));
    }

    #[test]
    fn type_and_property_names_count() {
        let positions = extract("/a.ts", "interface Foo { bar: Baz }");
        assert_eq!(positions, on_line(0, &[13, 19, 24]));
    }

    #[test]
    fn duplicates_are_kept_in_tree_order() {
        let positions = extract("/a.ts", "a(a)");
        assert_eq!(positions, on_line(0, &[1, 3]));
    }

    #[test]
    fn malformed_source_still_yields_identifiers() {
        let positions = extract("/a.ts", "let a = ;\nconst b = c;");
        assert!(positions.contains(&Position::new(1, 7)));
        assert!(positions.contains(&Position::new(1, 11)));
    }

    #[test]
    fn tsx_documents_use_jsx_grammar() {
        let positions = extract("/w.tsx", "const el = <Widget prop={x} />;");
        assert_eq!(positions, on_line(0, &[8, 18, 23, 26]));
    }

    #[test]
    fn keywords_are_not_identifiers() {
        let positions = extract("/a.ts", "this.run();");
        assert_eq!(positions, on_line(0, &[8]));
    }

    #[test]
    fn extraction_is_deterministic() {
        let text = "export function make(opts: Options) { return build(opts.kind); }";
        assert_eq!(extract("/a.ts", text), extract("/a.ts", text));
    }
}
