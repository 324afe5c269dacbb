use super::position::Range;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Documentation attached to a position by the hover oracle.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default, JsonSchema)]
pub struct HoverContent {
    /// Markdown or plain-text blocks, in provider order.
    pub contents: Vec<String>,
    /// Range the provider associates with the hovered symbol, if any.
    pub range: Option<Range>,
}

impl HoverContent {
    pub fn new(contents: Vec<String>, range: Option<Range>) -> Self {
        Self { contents, range }
    }

    pub fn contains(&self, marker: &str) -> bool {
        self.contents.iter().any(|block| block.contains(marker))
    }
}

/// Lifecycle classification of a symbol occurrence.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Internal,
    Alpha,
    Beta,
    Deprecated,
}

impl Phase {
    /// Classification order: the first phase that matches wins.
    pub const PRECEDENCE: [Phase; 4] = [Phase::Internal, Phase::Alpha, Phase::Beta, Phase::Deprecated];

    /// Marker searched verbatim in hover text. TypeScript renders JSDoc tags as `*@tag*`.
    pub fn marker(&self) -> &'static str {
        match self {
            Phase::Internal => "*@internal*",
            Phase::Alpha => "*@alpha*",
            Phase::Beta => "*@beta*",
            Phase::Deprecated => "*@deprecated*",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Internal => "internal",
            Phase::Alpha => "alpha",
            Phase::Beta => "beta",
            Phase::Deprecated => "deprecated",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Phase::PRECEDENCE
            .into_iter()
            .find(|phase| phase.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown phase '{}'", s))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct AnnotatedRange {
    /// Source text covered by `range`.
    pub name: String,
    pub range: Range,
    pub phase: Phase,
}

/// Per-file annotations bucketed by phase.
///
/// A range is classified at most once, so it appears in at most one bucket.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default, JsonSchema)]
pub struct FileAnnotationSet {
    pub internal: Vec<AnnotatedRange>,
    pub alpha: Vec<AnnotatedRange>,
    pub beta: Vec<AnnotatedRange>,
    pub deprecated: Vec<AnnotatedRange>,
}

impl FileAnnotationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bucket(&self, phase: Phase) -> &[AnnotatedRange] {
        match phase {
            Phase::Internal => &self.internal,
            Phase::Alpha => &self.alpha,
            Phase::Beta => &self.beta,
            Phase::Deprecated => &self.deprecated,
        }
    }

    fn bucket_mut(&mut self, phase: Phase) -> &mut Vec<AnnotatedRange> {
        match phase {
            Phase::Internal => &mut self.internal,
            Phase::Alpha => &mut self.alpha,
            Phase::Beta => &mut self.beta,
            Phase::Deprecated => &mut self.deprecated,
        }
    }

    pub fn push(&mut self, annotation: AnnotatedRange) {
        self.bucket_mut(annotation.phase).push(annotation);
    }

    pub fn len(&self) -> usize {
        Phase::PRECEDENCE.iter().map(|p| self.bucket(*p).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Buckets in precedence order, including empty ones.
    pub fn iter(&self) -> impl Iterator<Item = (Phase, &[AnnotatedRange])> {
        Phase::PRECEDENCE.into_iter().map(move |p| (p, self.bucket(p)))
    }

    pub fn annotations(&self) -> impl Iterator<Item = &AnnotatedRange> {
        self.iter().flat_map(|(_, bucket)| bucket.iter())
    }
}

/// File-keyed store of classified ranges. Readers hold it behind an `Arc`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default, JsonSchema)]
#[serde(transparent)]
pub struct AnnotationIndex {
    files: BTreeMap<PathBuf, Arc<FileAnnotationSet>>,
}

impl AnnotationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<&Arc<FileAnnotationSet>> {
        self.files.get(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    /// Replace the whole entry for `path`.
    pub fn insert(&mut self, path: PathBuf, set: Arc<FileAnnotationSet>) -> Option<Arc<FileAnnotationSet>> {
        self.files.insert(path, set)
    }

    pub fn remove(&mut self, path: &Path) -> Option<Arc<FileAnnotationSet>> {
        self.files.remove(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &Arc<FileAnnotationSet>)> {
        self.files.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.files.keys()
    }

    /// Number of files with an entry.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Number of annotations across all files.
    pub fn total(&self) -> usize {
        self.files.values().map(|set| set.len()).sum()
    }
}
