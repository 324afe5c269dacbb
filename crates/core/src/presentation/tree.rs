use alphabeta_api::{AnnotatedRange, AnnotationIndex, FileAnnotationSet, Phase, Range};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

pub const ROOT_LABEL: &str = "Prerelease Usage";

/// Hierarchical browser model: root → files → phases → occurrences.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationTree {
    pub label: &'static str,
    pub files: Vec<FileNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileNode {
    pub path: PathBuf,
    pub phases: Vec<PhaseNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseNode {
    pub phase: Phase,
    pub items: Vec<LineItem>,
}

/// A leaf; selecting it navigates to `range` in `path`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineItem {
    pub label: String,
    pub name: String,
    pub path: PathBuf,
    pub range: Range,
}

impl LineItem {
    fn new(path: &Path, annotated: &AnnotatedRange) -> Self {
        Self {
            label: format!(
                "[line: {}, char: {}] - {}",
                annotated.range.start.line + 1,
                annotated.range.start.character + 1,
                annotated.name
            ),
            name: annotated.name.clone(),
            path: path.to_path_buf(),
            range: annotated.range,
        }
    }
}

impl FileNode {
    fn new(path: &Path, set: &FileAnnotationSet) -> Self {
        let phases = set
            .iter()
            .filter(|(_, bucket)| !bucket.is_empty())
            .map(|(phase, bucket)| PhaseNode {
                phase,
                items: bucket.iter().map(|a| LineItem::new(path, a)).collect(),
            })
            .collect();
        Self {
            path: path.to_path_buf(),
            phases,
        }
    }
}

impl AnnotationTree {
    /// Tree for the active file only.
    pub fn for_file(index: &AnnotationIndex, path: &Path) -> Self {
        Self {
            label: ROOT_LABEL,
            files: index
                .get(path)
                .map(|set| vec![FileNode::new(path, set)])
                .unwrap_or_default(),
        }
    }

    /// Tree for every file that has at least one annotation.
    pub fn for_index(index: &AnnotationIndex) -> Self {
        Self {
            label: ROOT_LABEL,
            files: index
                .iter()
                .filter(|(_, set)| !set.is_empty())
                .map(|(path, set)| FileNode::new(path, set))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.files.iter().all(|f| f.phases.is_empty())
    }

    pub fn items(&self) -> impl Iterator<Item = &LineItem> {
        self.files
            .iter()
            .flat_map(|f| f.phases.iter())
            .flat_map(|p| p.items.iter())
    }
}

impl fmt::Display for AnnotationTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.label)?;
        for file in &self.files {
            writeln!(f, "  {}", file.path.display())?;
            for phase in &file.phases {
                writeln!(f, "    {}", phase.phase)?;
                for item in &phase.items {
                    writeln!(f, "      {}", item.label)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alphabeta_api::Position;
    use std::sync::Arc;

    fn annotated(name: &str, line: u32, character: u32, phase: Phase) -> AnnotatedRange {
        AnnotatedRange {
            name: name.into(),
            range: Range::new(
                Position::new(line, character),
                Position::new(line, character + name.len() as u32),
            ),
            phase,
        }
    }

    fn index() -> AnnotationIndex {
        let mut set = FileAnnotationSet::new();
        set.push(annotated("preview", 4, 2, Phase::Beta));
        set.push(annotated("secret", 0, 9, Phase::Internal));
        let mut index = AnnotationIndex::new();
        index.insert(PathBuf::from("/a.ts"), Arc::new(set));
        index.insert(PathBuf::from("/empty.ts"), Arc::new(FileAnnotationSet::new()));
        index
    }

    #[test]
    fn labels_are_one_based() {
        let tree = AnnotationTree::for_file(&index(), Path::new("/a.ts"));
        let labels: Vec<&str> = tree.items().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["[line: 1, char: 10] - secret", "[line: 5, char: 3] - preview"]);
    }

    #[test]
    fn only_non_empty_phases_in_precedence_order() {
        let tree = AnnotationTree::for_file(&index(), Path::new("/a.ts"));
        let phases: Vec<Phase> = tree.files[0].phases.iter().map(|p| p.phase).collect();
        assert_eq!(phases, vec![Phase::Internal, Phase::Beta]);
    }

    #[test]
    fn whole_index_skips_files_without_annotations() {
        let tree = AnnotationTree::for_index(&index());
        assert_eq!(tree.label, ROOT_LABEL);
        assert_eq!(tree.files.len(), 1);
        assert!(AnnotationTree::for_file(&index(), Path::new("/missing.ts")).is_empty());
    }

    #[test]
    fn items_carry_navigation_target() {
        let tree = AnnotationTree::for_file(&index(), Path::new("/a.ts"));
        let item = tree.items().next().unwrap();
        assert_eq!(item.path, PathBuf::from("/a.ts"));
        assert_eq!(item.range.start, Position::new(0, 9));
    }
}
