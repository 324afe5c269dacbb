use crate::config::AnnotationConfig;
use alphabeta_api::AnnotationIndex;
use serde::Serialize;
use std::path::Path;

/// Number of annotated occurrences in the active file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusCounter {
    pub count: usize,
    pub visible: bool,
}

impl StatusCounter {
    pub fn for_file(index: &AnnotationIndex, path: &Path, config: &AnnotationConfig) -> Self {
        let count = index.get(path).map(|set| set.len()).unwrap_or(0);
        Self {
            count,
            visible: config.reporting.show_in_status_bar && count > 0,
        }
    }

    /// Status bar text, or `None` when the item should be hidden.
    pub fn text(&self) -> Option<String> {
        self.visible.then(|| format!("Prereleased: {}", self.count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alphabeta_api::{AnnotatedRange, FileAnnotationSet, Phase, Position, Range};
    use std::path::PathBuf;
    use std::sync::Arc;

    fn index_with(count: usize) -> AnnotationIndex {
        let mut set = FileAnnotationSet::new();
        for i in 0..count {
            set.push(AnnotatedRange {
                name: format!("s{}", i),
                range: Range::new(Position::new(i as u32, 0), Position::new(i as u32, 2)),
                phase: Phase::Beta,
            });
        }
        let mut index = AnnotationIndex::new();
        index.insert(PathBuf::from("/a.ts"), Arc::new(set));
        index
    }

    #[test]
    fn shows_count_for_active_file() {
        let counter = StatusCounter::for_file(&index_with(3), Path::new("/a.ts"), &AnnotationConfig::default());
        assert_eq!(counter.text().as_deref(), Some("Prereleased: 3"));
    }

    #[test]
    fn hidden_when_empty_unknown_or_disabled() {
        let config = AnnotationConfig::default();
        assert!(StatusCounter::for_file(&index_with(0), Path::new("/a.ts"), &config).text().is_none());
        assert!(StatusCounter::for_file(&index_with(2), Path::new("/b.ts"), &config).text().is_none());

        let mut quiet = AnnotationConfig::default();
        quiet.reporting.show_in_status_bar = false;
        let counter = StatusCounter::for_file(&index_with(2), Path::new("/a.ts"), &quiet);
        assert_eq!(counter.count, 2);
        assert!(counter.text().is_none());
    }
}
