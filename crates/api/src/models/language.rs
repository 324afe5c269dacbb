use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Grammar flavour used to parse a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    TypeScript,
    Tsx,
}

impl SourceKind {
    /// Map a file extension to a grammar. JSX-bearing files need the TSX grammar;
    /// everything else, including unknown extensions, is parsed as TypeScript.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "tsx" | "jsx" => Self::Tsx,
            _ => Self::TypeScript,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::TypeScript)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TypeScript => "typescript",
            Self::Tsx => "tsx",
        }
    }

    /// LSP `languageId` for `textDocument/didOpen`.
    pub fn language_id(path: &Path) -> &'static str {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("tsx") => "typescriptreact",
            Some("jsx") => "javascriptreact",
            Some("js") | Some("mjs") | Some("cjs") => "javascript",
            _ => "typescript",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
