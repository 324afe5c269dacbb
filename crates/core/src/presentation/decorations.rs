use crate::config::AnnotationConfig;
use alphabeta_api::{AnnotationIndex, Phase, Range};
use serde::Serialize;
use std::path::Path;

/// Visual style for one phase's highlights.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecorationStyle {
    /// Theme colour id, e.g. `AlphaBETA.beta`.
    pub background_color: String,
    pub border_width: &'static str,
    pub border_radius: &'static str,
}

impl DecorationStyle {
    pub fn for_phase(phase: Phase) -> Self {
        Self {
            background_color: format!("AlphaBETA.{}", phase.as_str()),
            border_width: "2px",
            border_radius: "4px",
        }
    }
}

/// Ranges to paint in one document, grouped by phase.
///
/// Every phase is listed, including empty ones, so applying a plan also clears
/// highlights left over from the previous one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecorationPlan {
    pub layers: Vec<(Phase, DecorationStyle, Vec<Range>)>,
}

impl DecorationPlan {
    pub fn for_file(index: &AnnotationIndex, path: &Path, config: &AnnotationConfig) -> Self {
        let set = index.get(path);
        let layers = Phase::PRECEDENCE
            .into_iter()
            .map(|phase| {
                let ranges = match set {
                    Some(set) if config.phase_enabled(phase) => {
                        set.bucket(phase).iter().map(|a| a.range).collect()
                    }
                    _ => Vec::new(),
                };
                (phase, DecorationStyle::for_phase(phase), ranges)
            })
            .collect();
        Self { layers }
    }

    pub fn ranges(&self, phase: Phase) -> &[Range] {
        self.layers
            .iter()
            .find(|(p, _, _)| *p == phase)
            .map(|(_, _, ranges)| ranges.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(|(_, _, ranges)| ranges.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alphabeta_api::{AnnotatedRange, FileAnnotationSet, Position};
    use std::path::PathBuf;
    use std::sync::Arc;

    fn index() -> AnnotationIndex {
        let mut set = FileAnnotationSet::new();
        set.push(AnnotatedRange {
            name: "x".into(),
            range: Range::new(Position::new(0, 0), Position::new(0, 1)),
            phase: Phase::Alpha,
        });
        let mut index = AnnotationIndex::new();
        index.insert(PathBuf::from("/a.ts"), Arc::new(set));
        index
    }

    #[test]
    fn style_uses_theme_colour_per_phase() {
        let style = DecorationStyle::for_phase(Phase::Deprecated);
        assert_eq!(style.background_color, "AlphaBETA.deprecated");
        assert_eq!(style.border_width, "2px");
        assert_eq!(style.border_radius, "4px");
    }

    #[test]
    fn plan_lists_every_phase() {
        let plan = DecorationPlan::for_file(&index(), Path::new("/a.ts"), &AnnotationConfig::default());
        assert_eq!(plan.layers.len(), 4);
        assert_eq!(plan.ranges(Phase::Alpha).len(), 1);
        assert!(plan.ranges(Phase::Beta).is_empty());
    }

    #[test]
    fn disabled_phase_is_cleared() {
        let mut config = AnnotationConfig::default();
        config.phase.show_alpha = false;
        assert!(DecorationPlan::for_file(&index(), Path::new("/a.ts"), &config).is_empty());
    }
}
