//! Intent matcher - fuzzy scoring of user input against every registered intent

use std::cmp::Ordering;

use crate::config::ResolverConfig;
use crate::entities::Extraction;
use crate::filler::count_satisfiable;
use crate::normalizer::is_stopword;
use crate::registry::{IntentPattern, IntentRegistry};
use crate::similarity::align_tokens;
use crate::types::{CandidateMatch, Entity, Token};

/// Scores closer than this compare as equal.
const SCORE_RESOLUTION: f64 = 1e9;

/// Content words of the input, with the span of each word's first occurrence
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchInput {
    pub words: Vec<String>,
    pub spans: Vec<(usize, usize)>,
}

impl MatchInput {
    /// Keep tokens that are not stopwords and were not claimed by an entity or flag.
    pub fn from_tokens(tokens: &[Token], extraction: &Extraction) -> Self {
        let mut input = MatchInput::default();
        for token in tokens {
            if extraction.is_claimed(token.start, token.end) {
                continue;
            }
            let word = token
                .normalized
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase();
            if word.is_empty() || is_stopword(&word) || input.words.contains(&word) {
                continue;
            }
            input.words.push(word);
            input.spans.push(token.span());
        }
        input
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Ranked candidates plus the best intent regardless of the floor
#[derive(Debug, Clone)]
pub struct MatchReport<'r> {
    /// Candidates at or above the floor, best first.
    pub candidates: Vec<CandidateMatch<'r>>,
    /// Highest-scoring intent with a non-zero score, floor ignored.
    pub near_miss: Option<(&'r str, f64)>,
}

/// Quantized score for total ordering
fn score_key(score: f64) -> i64 {
    (score * SCORE_RESOLUTION).round() as i64
}

/// Candidate ordering: score, then satisfiable required slots, then the
/// shorter (more specific) trigger, then registry order.
fn rank_order(a: &CandidateMatch<'_>, b: &CandidateMatch<'_>) -> Ordering {
    score_key(b.score)
        .cmp(&score_key(a.score))
        .then(b.satisfiable.cmp(&a.satisfiable))
        .then(a.trigger.chars().count().cmp(&b.trigger.chars().count()))
        .then(a.registry_index.cmp(&b.registry_index))
}

pub struct IntentMatcher<'r> {
    registry: &'r IntentRegistry,
    config: &'r ResolverConfig,
}

impl<'r> IntentMatcher<'r> {
    pub fn new(registry: &'r IntentRegistry, config: &'r ResolverConfig) -> Self {
        Self { registry, config }
    }

    /// Score every intent (or only those named in `restrict`) and rank them.
    pub fn rank(
        &self,
        input: &MatchInput,
        entities: &[Entity],
        restrict: Option<&[String]>,
    ) -> MatchReport<'r> {
        let mut scored: Vec<CandidateMatch<'r>> = self
            .registry
            .list_patterns()
            .iter()
            .enumerate()
            .filter(|(_, p)| restrict.map_or(true, |ids| ids.iter().any(|id| id == p.id())))
            .map(|(index, pattern)| self.score_pattern(index, pattern, input, entities))
            .collect();

        scored.sort_by(rank_order);

        let near_miss = scored
            .first()
            .filter(|c| c.score > 0.0)
            .map(|c| (c.pattern.id(), c.score));

        for candidate in &scored {
            tracing::trace!(
                intent = candidate.intent_id(),
                score = candidate.score,
                trigger = candidate.trigger,
                satisfiable = candidate.satisfiable,
                "scored intent"
            );
        }

        let floor = score_key(self.config.score_floor);
        scored.retain(|c| score_key(c.score) >= floor);

        MatchReport {
            candidates: scored,
            near_miss,
        }
    }

    /// Best trigger of one pattern; ties go to the shorter template.
    fn score_pattern(
        &self,
        index: usize,
        pattern: &'r IntentPattern,
        input: &MatchInput,
        entities: &[Entity],
    ) -> CandidateMatch<'r> {
        let mut best: Option<(f64, &'r str, Vec<(usize, usize)>)> = None;

        for trigger in pattern.triggers() {
            let alignment =
                align_tokens(&input.words, trigger.words(), self.config.token_match_floor);
            let better = match &best {
                None => true,
                Some((score, text, _)) => {
                    match score_key(alignment.score).cmp(&score_key(*score)) {
                        Ordering::Greater => true,
                        Ordering::Equal => trigger.text().chars().count() < text.chars().count(),
                        Ordering::Less => false,
                    }
                }
            };
            if better {
                let anchors = alignment
                    .pairs
                    .iter()
                    .map(|pair| input.spans[pair.input_index])
                    .collect();
                best = Some((alignment.score, trigger.text(), anchors));
            }
        }

        let (score, trigger, anchors) = best.unwrap_or((0.0, "", Vec::new()));
        let satisfiable = count_satisfiable(pattern.required_slots(), entities);

        CandidateMatch {
            pattern,
            score,
            trigger,
            anchors,
            satisfiable,
            registry_index: index,
            bindings: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{LexiconAnalyzer, LinguisticAnalyzer};
    use crate::entities::EntityExtractor;
    use crate::normalizer::normalize;

    fn rank_input(registry: &IntentRegistry, input: &str) -> Vec<(String, f64)> {
        let config = ResolverConfig::default();
        let text = normalize(input).unwrap();
        let tokens = LexiconAnalyzer::new().analyze(text.as_str()).unwrap();
        let extraction = EntityExtractor::new().extract(&text, &tokens);
        let words = MatchInput::from_tokens(&tokens, &extraction);
        IntentMatcher::new(registry, &config)
            .rank(&words, &extraction.entities, None)
            .candidates
            .iter()
            .map(|c| (c.intent_id().to_string(), c.score))
            .collect()
    }

    #[test]
    fn test_exact_match() {
        let registry = IntentRegistry::builtin().unwrap();
        let ranked = rank_input(&registry, "show me all files");
        assert_eq!(ranked[0].0, "list-directory");
        assert!((ranked[0].1 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_typo_still_matches() {
        let registry = IntentRegistry::builtin().unwrap();
        let ranked = rank_input(&registry, "create a new directroy called projcets");
        assert_eq!(ranked[0].0, "make-directory");
        assert!(ranked[0].1 > 0.9);
        assert!(ranked[1].1 < ranked[0].1 - 0.15);
    }

    #[test]
    fn test_no_match() {
        let registry = IntentRegistry::builtin().unwrap();
        assert!(rank_input(&registry, "completely unrelated query").is_empty());
    }

    #[test]
    fn test_ties_break_by_registry_order() {
        let registry = IntentRegistry::builtin().unwrap();
        let ranked = rank_input(&registry, "delete test.txt");
        assert_eq!(ranked[0].0, "delete-file");
        assert_eq!(ranked[1].0, "remove-file");
        assert_eq!(ranked[0].1, ranked[1].1);
    }

    #[test]
    fn test_content_words_skip_entities_and_stopwords() {
        let text = normalize("please delete the Report.txt -f").unwrap();
        let tokens = LexiconAnalyzer::new().analyze(text.as_str()).unwrap();
        let extraction = EntityExtractor::new().extract(&text, &tokens);
        let input = MatchInput::from_tokens(&tokens, &extraction);
        assert_eq!(input.words, vec!["delete".to_string()]);
        assert_eq!(input.spans, vec![(7, 13)]);
    }

    #[test]
    fn test_restriction_limits_candidates() {
        let registry = IntentRegistry::builtin().unwrap();
        let config = ResolverConfig::default();
        let input = MatchInput {
            words: vec!["delete".to_string()],
            spans: vec![(0, 6)],
        };
        let only = vec!["remove-file".to_string()];
        let report = IntentMatcher::new(&registry, &config).rank(&input, &[], Some(&only));
        assert_eq!(report.candidates.len(), 1);
        assert_eq!(report.candidates[0].intent_id(), "remove-file");
    }

    #[test]
    fn test_near_miss_reported_below_floor() {
        let registry = IntentRegistry::builtin().unwrap();
        let config = ResolverConfig {
            score_floor: 0.99,
            ..ResolverConfig::default()
        };
        let input = MatchInput {
            words: vec!["lst".to_string(), "files".to_string()],
            spans: vec![(0, 3), (4, 9)],
        };
        let report = IntentMatcher::new(&registry, &config).rank(&input, &[], None);
        assert!(report.candidates.is_empty());
        assert_eq!(report.near_miss.map(|(id, _)| id), Some("list-directory"));
    }

    #[test]
    fn test_satisfiable_slots_break_score_ties() {
        use crate::registry::{IntentDef, RegistryBuilder, SlotDef};
        use crate::types::{IntentCategory, Recognizer, SlotType};

        let def = |id: &str, slot_type: SlotType| IntentDef {
            id: id.to_string(),
            category: IntentCategory::SystemOp,
            description: String::new(),
            triggers: vec!["stop {target}".to_string()],
            required: vec![SlotDef {
                name: "target".to_string(),
                slot_type,
                default: None,
            }],
            optional: Vec::new(),
        };
        let registry = RegistryBuilder::new()
            .register(def("stop-service", SlotType::Quantity))
            .unwrap()
            .register(def("stop-process", SlotType::Identifier))
            .unwrap()
            .build();
        let config = ResolverConfig::default();
        let input = MatchInput {
            words: vec!["stop".to_string()],
            spans: vec![(0, 4)],
        };
        let entities = vec![Entity::new(
            SlotType::Identifier,
            "nginx".to_string(),
            "nginx".to_string(),
            5,
            10,
            Recognizer::Identifier,
        )];
        let report = IntentMatcher::new(&registry, &config).rank(&input, &entities, None);
        assert_eq!(report.candidates[0].intent_id(), "stop-process");
        assert_eq!(report.candidates[0].satisfiable, 1);
    }

    #[test]
    fn test_one_entity_satisfies_one_slot() {
        use crate::registry::{IntentDef, RegistryBuilder, SlotDef};
        use crate::types::{IntentCategory, Recognizer, SlotType};

        let path_slot = |name: &str| SlotDef {
            name: name.to_string(),
            slot_type: SlotType::Path,
            default: None,
        };
        let def = |id: &str, trigger: &str, required: Vec<SlotDef>| IntentDef {
            id: id.to_string(),
            category: IntentCategory::FileOp,
            description: String::new(),
            triggers: vec![trigger.to_string()],
            required,
            optional: Vec::new(),
        };
        let registry = RegistryBuilder::new()
            .register(def("pack-pair", "pack {a} {b}", vec![path_slot("a"), path_slot("b")]))
            .unwrap()
            .register(def("pack-one", "pack {p}", vec![path_slot("p")]))
            .unwrap()
            .build();
        let config = ResolverConfig::default();
        let input = MatchInput {
            words: vec!["pack".to_string()],
            spans: vec![(0, 4)],
        };
        let entities = vec![Entity::new(
            SlotType::Path,
            "notes.txt".to_string(),
            "notes.txt".to_string(),
            5,
            14,
            Recognizer::PathLike,
        )];
        let report = IntentMatcher::new(&registry, &config).rank(&input, &entities, None);
        let ranked: Vec<(&str, usize)> = report
            .candidates
            .iter()
            .map(|c| (c.intent_id(), c.satisfiable))
            .collect();
        // Equal satisfiable counts fall through to the shorter trigger
        assert_eq!(ranked, vec![("pack-one", 1), ("pack-pair", 1)]);
    }
}
