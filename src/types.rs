//! Core data types flowing through the resolution pipeline

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::registry::IntentPattern;

/// Universal part-of-speech tags reported by the linguistic analyzer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PosTag {
    Noun,
    Propn,
    Verb,
    Adj,
    Adv,
    Adp,
    Det,
    Pron,
    Num,
    Cconj,
    Part,
    Punct,
    X,
}

/// A tagged token produced by the linguistic analyzer
///
/// Offsets are byte offsets into the normalized text that was analyzed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub surface: String,
    pub normalized: String,
    pub pos: PosTag,
    pub ner: Option<String>,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn new(surface: &str, pos: PosTag, start: usize) -> Self {
        Self {
            surface: surface.to_string(),
            normalized: surface.to_lowercase(),
            pos,
            ner: None,
            start,
            end: start + surface.len(),
        }
    }

    pub fn with_ner(mut self, label: &str) -> Self {
        self.ner = Some(label.to_string());
        self
    }

    pub fn span(&self) -> (usize, usize) {
        (self.start, self.end)
    }
}

/// Semantic type of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotType {
    Path,
    Identifier,
    Quantity,
    FreeText,
}

impl fmt::Display for SlotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SlotType::Path => "path",
            SlotType::Identifier => "identifier",
            SlotType::Quantity => "quantity",
            SlotType::FreeText => "free-text",
        };
        f.write_str(name)
    }
}

/// A validated, typed slot value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlotValue {
    Path { value: String },
    Identifier { value: String },
    Quantity { amount: f64, unit: Option<String> },
    Text { value: String },
}

impl SlotValue {
    pub fn path(value: impl Into<String>) -> Self {
        SlotValue::Path {
            value: value.into(),
        }
    }

    pub fn identifier(value: impl Into<String>) -> Self {
        SlotValue::Identifier {
            value: value.into(),
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        SlotValue::Text {
            value: value.into(),
        }
    }

    pub fn slot_type(&self) -> SlotType {
        match self {
            SlotValue::Path { .. } => SlotType::Path,
            SlotValue::Identifier { .. } => SlotType::Identifier,
            SlotValue::Quantity { .. } => SlotType::Quantity,
            SlotValue::Text { .. } => SlotType::FreeText,
        }
    }

    /// String payload for textual values
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SlotValue::Path { value }
            | SlotValue::Identifier { value }
            | SlotValue::Text { value } => Some(value),
            SlotValue::Quantity { .. } => None,
        }
    }
}

impl fmt::Display for SlotValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotValue::Path { value }
            | SlotValue::Identifier { value }
            | SlotValue::Text { value } => f.write_str(value),
            SlotValue::Quantity { amount, unit } => match unit {
                Some(unit) => write!(f, "{}{}", amount, unit),
                None => write!(f, "{}", amount),
            },
        }
    }
}

/// Which extraction layer claimed an entity span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recognizer {
    Quoted,
    PathLike,
    Identifier,
    Quantity,
}

/// A slot candidate extracted from user input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub kind: SlotType,
    pub value: String,    // normalized text of the span
    pub original: String, // same span with original casing
    pub start: usize,
    pub end: usize,
    pub recognizer: Recognizer,
}

impl Entity {
    pub fn new(
        kind: SlotType,
        value: String,
        original: String,
        start: usize,
        end: usize,
        recognizer: Recognizer,
    ) -> Self {
        Self {
            kind,
            value,
            original,
            start,
            end,
            recognizer,
        }
    }
}

/// A slot bound to an intent during filling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub name: String,
    pub slot_type: SlotType,
    pub raw: String,
    pub value: Option<SlotValue>,
    /// Source span in the normalized text; `None` for defaults.
    pub span: Option<(usize, usize)>,
}

/// Broad grouping of intents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntentCategory {
    FileOp,
    SystemOp,
    GitOp,
}

/// A provisional match between the input and one intent
#[derive(Debug, Clone)]
pub struct CandidateMatch<'r> {
    pub pattern: &'r IntentPattern,
    pub score: f64,
    /// The trigger template that produced `score`.
    pub trigger: &'r str,
    /// Spans of input words aligned with the trigger's words.
    pub anchors: Vec<(usize, usize)>,
    /// Required slots that distinct extracted entities could satisfy.
    pub satisfiable: usize,
    /// Position of the pattern in the registry.
    pub registry_index: usize,
    pub bindings: Vec<Slot>,
}

impl CandidateMatch<'_> {
    pub fn intent_id(&self) -> &str {
        self.pattern.id()
    }

    /// Validated bindings keyed by slot name
    pub fn slot_values(&self) -> BTreeMap<String, SlotValue> {
        self.bindings
            .iter()
            .filter_map(|slot| slot.value.clone().map(|v| (slot.name.clone(), v)))
            .collect()
    }
}

/// The single artifact handed to the command executor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedCommand {
    intent_id: String,
    category: IntentCategory,
    slots: BTreeMap<String, SlotValue>,
    flags: Vec<String>,
    confidence: f64,
}

impl ResolvedCommand {
    /// Build a command from a filled candidate.
    ///
    /// Returns `None` unless every required slot carries a validated value.
    pub(crate) fn from_candidate(
        candidate: &CandidateMatch<'_>,
        flags: Vec<String>,
    ) -> Option<Self> {
        let slots = candidate.slot_values();
        let complete = candidate
            .pattern
            .required_slots()
            .iter()
            .all(|spec| {
                matches!(slots.get(spec.name()), Some(v) if v.slot_type() == spec.slot_type())
            });
        if !complete {
            return None;
        }

        Some(Self {
            intent_id: candidate.pattern.id().to_string(),
            category: candidate.pattern.category(),
            slots,
            flags,
            confidence: candidate.score,
        })
    }

    pub fn intent_id(&self) -> &str {
        &self.intent_id
    }

    pub fn category(&self) -> IntentCategory {
        self.category
    }

    pub fn slots(&self) -> &BTreeMap<String, SlotValue> {
        &self.slots
    }

    pub fn slot(&self, name: &str) -> Option<&SlotValue> {
        self.slots.get(name)
    }

    /// Option flags (`-r`, `--force`) passed through verbatim
    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Serialize for hand-off to an out-of-process executor
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// One option offered during a clarification round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClarificationOption {
    pub intent_id: String,
    pub description: String,
    pub category: IntentCategory,
    pub score: f64,
    pub slots: BTreeMap<String, SlotValue>,
}

impl ClarificationOption {
    /// Human-readable line for presentation, e.g.
    /// `remove-file: Permanently remove a file (path=a.txt)`
    pub fn label(&self) -> String {
        if self.slots.is_empty() {
            return format!("{}: {}", self.intent_id, self.description);
        }
        let slots: Vec<String> = self
            .slots
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect();
        format!("{}: {} ({})", self.intent_id, self.description, slots.join(", "))
    }
}

/// Near-tied candidates the caller must choose between
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClarificationRequest {
    pub original_input: String,
    pub options: Vec<ClarificationOption>,
}

impl ClarificationRequest {
    pub fn intent_ids(&self) -> Vec<&str> {
        self.options.iter().map(|o| o.intent_id.as_str()).collect()
    }
}

/// Result of resolving one phrase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outcome {
    Resolved(ResolvedCommand),
    NeedsClarification(ClarificationRequest),
}

impl Outcome {
    pub fn stage(&self) -> Stage {
        match self {
            Outcome::Resolved(_) => Stage::Resolved,
            Outcome::NeedsClarification(_) => Stage::NeedsClarification,
        }
    }

    pub fn resolved(&self) -> Option<&ResolvedCommand> {
        match self {
            Outcome::Resolved(command) => Some(command),
            Outcome::NeedsClarification(_) => None,
        }
    }

    pub fn clarification(&self) -> Option<&ClarificationRequest> {
        match self {
            Outcome::NeedsClarification(request) => Some(request),
            Outcome::Resolved(_) => None,
        }
    }
}

/// Pipeline states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Parsing,
    Matching,
    Filling,
    Resolved,
    NeedsClarification,
    Rejected,
}

impl Stage {
    /// `NeedsClarification` is not terminal: one follow-up returns to `Filling`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Resolved | Stage::Rejected)
    }
}
