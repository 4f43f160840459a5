//! Error types for every stage of intent resolution
//!
//! Only [`ResolveError`] crosses the pipeline boundary at runtime.
//! [`RegistryError`] and [`ConfigError`] are startup failures, and
//! [`SlotError`] never leaves the slot filler on its own.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Terminal failures of a single resolution call.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Nothing to parse after normalization. The caller should re-prompt.
    #[error("input is empty")]
    EmptyInput,

    /// The linguistic analysis service failed. Never retried inside the core.
    #[error("linguistic analysis unavailable: {0}")]
    AnalysisUnavailable(#[from] AnalysisError),

    /// No candidate survived matching, filling and disambiguation.
    #[error("command not understood: '{input}'{}", did_you_mean(.near_miss))]
    UnrecognizedCommand {
        input: String,
        near_miss: Option<String>,
        reason: RejectReason,
    },
}

impl ResolveError {
    /// Best near-miss intent for "did you mean" prompts, if any.
    pub fn near_miss(&self) -> Option<&str> {
        match self {
            ResolveError::UnrecognizedCommand { near_miss, .. } => near_miss.as_deref(),
            _ => None,
        }
    }

    /// Whether the interaction layer can simply ask again.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ResolveError::UnrecognizedCommand { .. })
    }
}

fn did_you_mean(near_miss: &Option<String>) -> String {
    match near_miss {
        Some(intent) => format!(" (did you mean '{}'?)", intent),
        None => String::new(),
    }
}

/// Why a phrase ended in the rejected state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Every intent scored below the floor.
    BelowFloor,
    /// Candidates matched but none could bind its required slots.
    SlotsUnfilled,
    /// The clarification reply did not single out one option.
    ClarificationUnresolved,
}

/// Failures reported by a [`crate::analysis::LinguisticAnalyzer`].
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("{0}")]
    Unavailable(String),

    #[error("token '{surface}' has span {start}..{end} outside the analyzed text")]
    MalformedToken {
        surface: String,
        start: usize,
        end: usize,
    },

    #[error("token '{surface}' at {start} overlaps or precedes the token ending at {previous_end}")]
    OutOfOrder {
        surface: String,
        start: usize,
        previous_end: usize,
    },
}

/// Startup failures while building the intent registry.
///
/// These indicate a packaging defect and abort initialization.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate intent identifier '{0}'")]
    DuplicateIntent(String),

    #[error("intent identifier '{0}' is not a valid identifier")]
    InvalidIdentifier(String),

    #[error("intent '{0}' has no trigger templates")]
    NoTriggers(String),

    #[error("intent '{intent}' trigger '{trigger}' has no matchable words")]
    EmptyTrigger { intent: String, trigger: String },

    #[error("intent '{intent}' trigger '{trigger}' references unknown slot '{slot}'")]
    UnknownPlaceholder {
        intent: String,
        trigger: String,
        slot: String,
    },

    #[error("intent '{intent}' declares slot '{slot}' more than once")]
    DuplicateSlot { intent: String, slot: String },

    #[error("intent '{intent}' slot '{slot}' has an invalid default: {source}")]
    InvalidDefault {
        intent: String,
        slot: String,
        #[source]
        source: SlotError,
    },

    #[error("unsupported registry table version {0}")]
    UnsupportedVersion(u32),

    #[error("failed to parse registry table: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Slot validation failures. Local to the slot filler.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SlotError {
    #[error("value is empty")]
    Empty,

    #[error("path contains a control character")]
    ControlCharacter,

    #[error("'{0}' is not a non-negative quantity")]
    NotAQuantity(String),

    #[error("'{0}' is not a valid identifier")]
    InvalidIdentifier(String),
}

/// Invalid resolver configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be within [0, 1], got {value}")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("max_clarification_options must be at least 2, got {0}")]
    TooFewOptions(usize),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}
