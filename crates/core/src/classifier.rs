//! Phase classification of one position's hover results.

use crate::config::{AnnotationConfig, RangePolicy};
use alphabeta_api::{AnnotatedRange, Document, HoverContent, Phase, Position, Range};

/// Classifier bound to one configuration snapshot.
#[derive(Debug, Clone)]
pub struct Classifier {
    enabled: Vec<Phase>,
    policy: RangePolicy,
}

impl Classifier {
    pub fn new(config: &AnnotationConfig) -> Self {
        Self {
            enabled: Phase::PRECEDENCE
                .into_iter()
                .filter(|p| config.phase_enabled(*p))
                .collect(),
            policy: config.control.range_policy,
        }
    }

    /// The first enabled phase, in precedence order, whose marker appears in any entry.
    pub fn phase_of(&self, hovers: &[HoverContent]) -> Option<Phase> {
        self.enabled
            .iter()
            .copied()
            .find(|phase| hovers.iter().any(|h| h.contains(phase.marker())))
    }

    /// Classify the identifier ending at `position`.
    ///
    /// The range comes from the entry picked by the range policy, falling back to
    /// the nearest earlier entry with a range and then to the identifier itself.
    pub fn classify(
        &self,
        position: Position,
        hovers: &[HoverContent],
        document: &Document,
    ) -> Option<AnnotatedRange> {
        let phase = self.phase_of(hovers)?;
        let range = self
            .pick_range(hovers, phase)
            .or_else(|| document.word_end_range(position))?;

        Some(AnnotatedRange {
            name: document.text_in(range).to_string(),
            range,
            phase,
        })
    }

    fn pick_range(&self, hovers: &[HoverContent], phase: Phase) -> Option<Range> {
        let anchor = match self.policy {
            RangePolicy::LastEntry => hovers.len().checked_sub(1)?,
            RangePolicy::FirstMatching => hovers.iter().position(|h| h.contains(phase.marker()))?,
        };
        hovers[..=anchor].iter().rev().find_map(|h| h.range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "import { secret, preview } from './lib';\nsecret(preview);";

    fn document() -> Document {
        Document::new("/app.ts", SOURCE, 1)
    }

    fn range(line: u32, start: u32, end: u32) -> Range {
        Range::new(Position::new(line, start), Position::new(line, end))
    }

    fn hover(text: &str, range: Option<Range>) -> HoverContent {
        HoverContent::new(vec![text.to_string()], range)
    }

    fn config(edit: impl FnOnce(&mut AnnotationConfig)) -> AnnotationConfig {
        let mut config = AnnotationConfig::default();
        edit(&mut config);
        config
    }

    #[test]
    fn internal_beats_beta() {
        let classifier = Classifier::new(&AnnotationConfig::default());
        let hovers = vec![hover("*@beta* *@internal* both", Some(range(1, 0, 6)))];
        let annotated = classifier.classify(Position::new(1, 6), &hovers, &document()).unwrap();
        assert_eq!(annotated.phase, Phase::Internal);
        assert_eq!(annotated.name, "secret");
    }

    #[test]
    fn precedence_spans_entries() {
        let classifier = Classifier::new(&AnnotationConfig::default());
        let hovers = vec![
            hover("*@beta* Preview", Some(range(1, 7, 14))),
            hover("*@alpha* Early", Some(range(1, 7, 14))),
        ];
        assert_eq!(classifier.phase_of(&hovers), Some(Phase::Alpha));
    }

    #[test]
    fn disabled_phase_falls_through_to_next() {
        let classifier = Classifier::new(&config(|c| c.phase.show_internal = false));
        let hovers = vec![hover("*@internal* *@beta*", Some(range(1, 0, 6)))];
        assert_eq!(classifier.phase_of(&hovers), Some(Phase::Beta));
    }

    #[test]
    fn disabled_alpha_is_never_produced() {
        let classifier = Classifier::new(&config(|c| c.phase.show_alpha = false));
        let hovers = vec![hover("*@alpha* Early", Some(range(1, 7, 14)))];
        assert!(classifier.classify(Position::new(1, 14), &hovers, &document()).is_none());
    }

    #[test]
    fn global_switch_disables_everything() {
        let classifier = Classifier::new(&config(|c| c.control.show_annotations = false));
        let hovers = vec![hover("*@internal* *@alpha* *@beta* *@deprecated*", Some(range(1, 0, 6)))];
        assert!(classifier.phase_of(&hovers).is_none());
    }

    #[test]
    fn deprecated_is_opt_in() {
        let hovers = vec![hover("*@deprecated* use other", Some(range(1, 0, 6)))];
        assert!(Classifier::new(&AnnotationConfig::default()).phase_of(&hovers).is_none());
        let classifier = Classifier::new(&config(|c| c.phase.show_deprecated = true));
        assert_eq!(classifier.phase_of(&hovers), Some(Phase::Deprecated));
    }

    #[test]
    fn unmarked_hover_yields_nothing() {
        let classifier = Classifier::new(&AnnotationConfig::default());
        let hovers = vec![hover("function secret(): void", Some(range(1, 0, 6)))];
        assert!(classifier.classify(Position::new(1, 6), &hovers, &document()).is_none());
        assert!(classifier.classify(Position::new(1, 6), &[], &document()).is_none());
    }

    #[test]
    fn last_entry_supplies_the_range() {
        let classifier = Classifier::new(&AnnotationConfig::default());
        let hovers = vec![
            hover("*@beta* Preview", Some(range(0, 17, 24))),
            hover("(alias) preview", Some(range(1, 7, 14))),
        ];
        let annotated = classifier.classify(Position::new(1, 14), &hovers, &document()).unwrap();
        assert_eq!(annotated.range, range(1, 7, 14));
        assert_eq!(annotated.name, "preview");
    }

    #[test]
    fn first_matching_policy_uses_marked_entry() {
        let classifier = Classifier::new(&config(|c| c.control.range_policy = RangePolicy::FirstMatching));
        let hovers = vec![
            hover("*@beta* Preview", Some(range(0, 17, 24))),
            hover("(alias) preview", Some(range(1, 7, 14))),
        ];
        let annotated = classifier.classify(Position::new(1, 14), &hovers, &document()).unwrap();
        assert_eq!(annotated.range, range(0, 17, 24));
    }

    #[test]
    fn missing_ranges_fall_back_to_identifier() {
        let classifier = Classifier::new(&AnnotationConfig::default());
        let hovers = vec![hover("*@internal* Do not use", None)];
        let annotated = classifier.classify(Position::new(0, 15), &hovers, &document()).unwrap();
        assert_eq!(annotated.range, range(0, 9, 15));
        assert_eq!(annotated.name, "secret");
    }

    #[test]
    fn earlier_range_used_when_last_has_none() {
        let classifier = Classifier::new(&AnnotationConfig::default());
        let hovers = vec![
            hover("*@internal*", Some(range(1, 0, 6))),
            hover("more docs", None),
        ];
        let annotated = classifier.classify(Position::new(1, 6), &hovers, &document()).unwrap();
        assert_eq!(annotated.range, range(1, 0, 6));
    }
}
