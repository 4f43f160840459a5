//! End-to-end intent resolution
//!
//! `Parsing -> Matching -> Filling -> {Resolved | NeedsClarification | Rejected}`
//!
//! A [`Resolver`] holds no per-call state. The registry sits behind an `Arc`
//! and is only read, so one resolver (or many sharing a registry) can serve
//! concurrent callers. A clarification round is explicit: the caller passes
//! the [`ClarificationRequest`] back together with the user's reply.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::analysis::{validate_tokens, LinguisticAnalyzer};
use crate::config::ResolverConfig;
use crate::disambiguator::{Decision, Disambiguator, Round};
use crate::entities::EntityExtractor;
use crate::error::{ConfigError, RejectReason, ResolveError};
use crate::filler::SlotFiller;
use crate::matcher::{IntentMatcher, MatchInput};
use crate::normalizer::normalize;
use crate::registry::IntentRegistry;
use crate::sequence::{SequenceStage, StageSplitter};
use crate::types::{CandidateMatch, ClarificationRequest, Outcome, ResolvedCommand, Stage};

pub struct Resolver<A> {
    registry: Arc<IntentRegistry>,
    analyzer: A,
    config: ResolverConfig,
    extractor: EntityExtractor,
    filler: SlotFiller,
    disambiguator: Disambiguator,
    splitter: StageSplitter,
}

impl<A: LinguisticAnalyzer> Resolver<A> {
    /// Create a resolver, validating `config` first.
    pub fn new(
        registry: Arc<IntentRegistry>,
        analyzer: A,
        config: ResolverConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::assemble(registry, analyzer, config))
    }

    /// Create a resolver with the default thresholds.
    pub fn with_defaults(registry: Arc<IntentRegistry>, analyzer: A) -> Self {
        Self::assemble(registry, analyzer, ResolverConfig::default())
    }

    fn assemble(registry: Arc<IntentRegistry>, analyzer: A, config: ResolverConfig) -> Self {
        Self {
            disambiguator: Disambiguator::from_config(&config),
            registry,
            analyzer,
            config,
            extractor: EntityExtractor::new(),
            filler: SlotFiller::new(),
            splitter: StageSplitter::new(),
        }
    }

    pub fn registry(&self) -> &IntentRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve one phrase.
    ///
    /// Yields exactly one of a resolved command, a clarification request or
    /// an error. Rejection is `ResolveError::UnrecognizedCommand`.
    pub fn resolve(&self, input: &str) -> Result<Outcome, ResolveError> {
        self.run(input, None, Round::Initial)
    }

    /// Finish a clarification round.
    ///
    /// `reply` picks among `request.options` by number, identifier or phrase.
    /// The original input is re-resolved against the chosen options only; a
    /// reply that still leaves a tie is rejected rather than asked again.
    pub fn resolve_clarification(
        &self,
        request: &ClarificationRequest,
        reply: &str,
    ) -> Result<Outcome, ResolveError> {
        let reply = normalize(reply)?;
        let chosen = self
            .disambiguator
            .interpret_reply(request, &reply, &self.registry);
        debug!(reply = reply.as_str(), chosen = ?chosen, "clarification reply");

        if chosen.is_empty() {
            debug!(stage = ?Stage::Rejected, "reply selected no option");
            return Err(ResolveError::UnrecognizedCommand {
                input: request.original_input.clone(),
                near_miss: request.options.first().map(|o| o.intent_id.clone()),
                reason: RejectReason::ClarificationUnresolved,
            });
        }

        self.run(&request.original_input, Some(chosen.as_slice()), Round::FollowUp)
    }

    /// Split a compound phrase and resolve each stage independently.
    pub fn resolve_sequence(&self, input: &str) -> Result<Vec<SequenceStage>, ResolveError> {
        normalize(input)?;
        let stages = self.splitter.split(input);
        if stages.is_empty() {
            return Err(ResolveError::EmptyInput);
        }
        debug!(stages = stages.len(), "resolving compound phrase");

        Ok(stages
            .into_iter()
            .map(|text| SequenceStage {
                text: text.to_string(),
                outcome: self.resolve(text),
            })
            .collect())
    }

    fn run(
        &self,
        input: &str,
        restrict: Option<&[String]>,
        round: Round,
    ) -> Result<Outcome, ResolveError> {
        debug!(stage = ?Stage::Parsing, input, ?round);
        let text = normalize(input)?;

        let tokens = self.analyzer.analyze(text.as_str()).map_err(|err| {
            warn!(%err, "linguistic analysis failed");
            err
        })?;
        validate_tokens(text.as_str(), &tokens).map_err(|err| {
            warn!(%err, "analyzer returned malformed tokens");
            err
        })?;

        let extraction = self.extractor.extract(&text, &tokens);
        let words = MatchInput::from_tokens(&tokens, &extraction);
        debug!(
            stage = ?Stage::Matching,
            words = ?words.words,
            entities = extraction.entities.len(),
            flags = ?extraction.flags
        );

        let report = IntentMatcher::new(&self.registry, &self.config).rank(
            &words,
            &extraction.entities,
            restrict,
        );
        if report.candidates.is_empty() {
            let reason = match round {
                Round::Initial => RejectReason::BelowFloor,
                Round::FollowUp => RejectReason::ClarificationUnresolved,
            };
            return Err(self.reject(input, report.near_miss.map(|(id, _)| id), reason));
        }

        debug!(stage = ?Stage::Filling, candidates = report.candidates.len());
        let mut survivors: Vec<CandidateMatch<'_>> = Vec::with_capacity(report.candidates.len());
        let mut demoted: Option<&str> = None;
        for mut candidate in report.candidates {
            match self.filler.fill(&mut candidate, &extraction.entities) {
                Ok(()) => survivors.push(candidate),
                Err(err) => {
                    debug!(%err, "candidate demoted");
                    demoted.get_or_insert(candidate.pattern.id());
                }
            }
        }

        match self.disambiguator.decide(survivors, round) {
            Decision::Accept(candidate) => {
                match ResolvedCommand::from_candidate(&candidate, extraction.flags) {
                    Some(command) => {
                        debug!(
                            stage = ?Stage::Resolved,
                            intent = command.intent_id(),
                            confidence = command.confidence()
                        );
                        Ok(Outcome::Resolved(command))
                    }
                    None => Err(self.reject(
                        input,
                        Some(candidate.pattern.id()),
                        RejectReason::SlotsUnfilled,
                    )),
                }
            }
            Decision::Clarify(tied) => {
                let request = self.disambiguator.clarification(input, &tied);
                debug!(stage = ?Stage::NeedsClarification, options = ?request.intent_ids());
                Ok(Outcome::NeedsClarification(request))
            }
            Decision::NoCandidate => {
                let reason = match round {
                    Round::Initial => RejectReason::SlotsUnfilled,
                    Round::FollowUp => RejectReason::ClarificationUnresolved,
                };
                Err(self.reject(input, demoted, reason))
            }
            Decision::Unresolved(tied) => Err(self.reject(
                input,
                tied.first().map(|c| c.pattern.id()),
                RejectReason::ClarificationUnresolved,
            )),
        }
    }

    fn reject(&self, input: &str, near_miss: Option<&str>, reason: RejectReason) -> ResolveError {
        debug!(stage = ?Stage::Rejected, ?reason, near_miss);
        ResolveError::UnrecognizedCommand {
            input: input.to_string(),
            near_miss: near_miss.map(str::to_string),
            reason,
        }
    }
}
