//! Disambiguator - decides between accepting, clarifying and rejecting

use crate::config::ResolverConfig;
use crate::normalizer::{is_stopword, NormalizedText};
use crate::registry::IntentRegistry;
use crate::similarity::{align_tokens, word_set};
use crate::types::{CandidateMatch, ClarificationOption, ClarificationRequest};

/// Score differences smaller than this are treated as float noise.
const EPSILON: f64 = 1e-9;

/// Which clarification round a resolution belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Round {
    /// Fresh, open-ended resolution.
    Initial,
    /// Re-resolution restricted to options offered in a clarification.
    FollowUp,
}

/// Decision for a ranked list of filled candidates
#[derive(Debug)]
pub enum Decision<'r> {
    Accept(CandidateMatch<'r>),
    /// Near-tied candidates, best first, at least two.
    Clarify(Vec<CandidateMatch<'r>>),
    NoCandidate,
    /// Still tied after a follow-up round.
    Unresolved(Vec<CandidateMatch<'r>>),
}

#[derive(Debug, Clone)]
pub struct Disambiguator {
    tie_margin: f64,
    max_options: usize,
    score_floor: f64,
    token_match_floor: f64,
}

impl Disambiguator {
    pub fn from_config(config: &ResolverConfig) -> Self {
        Self {
            tie_margin: config.tie_margin,
            max_options: config.max_clarification_options.max(2),
            score_floor: config.score_floor,
            token_match_floor: config.token_match_floor,
        }
    }

    /// Apply the decision policy to candidates that survived slot filling,
    /// ordered best first.
    pub fn decide<'r>(
        &self,
        mut candidates: Vec<CandidateMatch<'r>>,
        round: Round,
    ) -> Decision<'r> {
        if candidates.is_empty() {
            return Decision::NoCandidate;
        }

        let top = candidates[0].score;
        let clear_winner = match candidates.get(1) {
            None => true,
            Some(second) => top - second.score + EPSILON >= self.tie_margin,
        };
        if clear_winner {
            return Decision::Accept(candidates.swap_remove(0));
        }

        candidates.retain(|c| top - c.score + EPSILON < self.tie_margin);
        candidates.truncate(self.max_options);

        match round {
            Round::Initial => Decision::Clarify(candidates),
            Round::FollowUp => Decision::Unresolved(candidates),
        }
    }

    /// Build the request presented to the user for a `Clarify` decision.
    pub fn clarification(
        &self,
        original_input: &str,
        candidates: &[CandidateMatch<'_>],
    ) -> ClarificationRequest {
        let options = candidates
            .iter()
            .map(|c| ClarificationOption {
                intent_id: c.intent_id().to_string(),
                description: c.pattern.description().to_string(),
                category: c.pattern.category(),
                score: c.score,
                slots: c.slot_values(),
            })
            .collect();

        ClarificationRequest {
            original_input: original_input.to_string(),
            options,
        }
    }

    /// Map a clarification reply to the offered intents it selects.
    ///
    /// Accepts a 1-based option number, an intent identifier, or a phrase
    /// scored against each option's identifier, description and triggers.
    /// Returns every option within the tie margin of the best phrase match,
    /// or nothing if the reply selects no option.
    pub fn interpret_reply(
        &self,
        request: &ClarificationRequest,
        reply: &NormalizedText,
        registry: &IntentRegistry,
    ) -> Vec<String> {
        let trimmed = reply
            .as_str()
            .trim_end_matches(|c: char| c == '.' || c == ')' || c == ':');

        if let Ok(index) = trimmed.parse::<usize>() {
            return match index.checked_sub(1).and_then(|i| request.options.get(i)) {
                Some(option) => vec![option.intent_id.clone()],
                None => Vec::new(),
            };
        }

        if let Some(option) = request.options.iter().find(|o| o.intent_id == trimmed) {
            return vec![option.intent_id.clone()];
        }

        let reply_words = word_set(
            reply
                .words()
                .map(|(_, _, word)| word)
                .filter(|word| !is_stopword(word)),
        );
        if reply_words.is_empty() {
            return Vec::new();
        }

        let scored: Vec<(&str, f64)> = request
            .options
            .iter()
            .map(|option| {
                let vocabulary = option_vocabulary(option, registry);
                let alignment = align_tokens(&reply_words, &vocabulary, self.token_match_floor);
                let matched: f64 = alignment.pairs.iter().map(|p| p.ratio).sum();
                (option.intent_id.as_str(), matched / reply_words.len() as f64)
            })
            .collect();

        let best = scored.iter().map(|(_, s)| *s).fold(0.0, f64::max);
        if best + EPSILON < self.score_floor {
            return Vec::new();
        }

        scored
            .into_iter()
            .filter(|(_, score)| best - score + EPSILON < self.tie_margin)
            .map(|(id, _)| id.to_string())
            .collect()
    }
}

/// Words describing an option: identifier parts, description and trigger words
fn option_vocabulary(option: &ClarificationOption, registry: &IntentRegistry) -> Vec<String> {
    let id_words = option.intent_id.split('-');
    let description = option.description.split_whitespace();
    let triggers = registry
        .get(&option.intent_id)
        .into_iter()
        .flat_map(|p| p.triggers())
        .flat_map(|t| t.words())
        .map(String::as_str);

    let words: Vec<String> = id_words
        .chain(description)
        .chain(triggers)
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| !w.is_empty() && !is_stopword(w))
        .collect();
    word_set(words.iter().map(String::as_str))
}
