//! Intent pattern registry
//!
//! Built once at startup and read-only afterwards, so one instance can be
//! shared behind an `Arc` by any number of concurrent resolutions. Every
//! startup defect (duplicate identifiers, placeholders naming undeclared
//! slots, unparseable defaults) is reported as a [`RegistryError`].

use ahash::AHashMap;
use serde::Deserialize;

use crate::builtin::{BuiltinIntent, BUILTIN_INTENTS, BUILTIN_TABLE_VERSION};
use crate::error::RegistryError;
use crate::filler::validate_value;
use crate::normalizer::is_stopword;
use crate::types::{IntentCategory, SlotType, SlotValue};

/// Declared parameter of an intent
#[derive(Debug, Clone, PartialEq)]
pub struct SlotSpec {
    name: String,
    slot_type: SlotType,
    default: Option<SlotValue>,
}

impl SlotSpec {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slot_type(&self) -> SlotType {
        self.slot_type
    }

    pub fn default_value(&self) -> Option<&SlotValue> {
        self.default.as_ref()
    }
}

/// A trigger phrase with its placeholders split out
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerTemplate {
    text: String,
    words: Vec<String>,
    placeholders: Vec<String>,
}

impl TriggerTemplate {
    fn parse(text: &str) -> Self {
        let mut words: Vec<String> = Vec::new();
        let mut placeholders = Vec::new();

        for raw in text.split_whitespace() {
            if let Some(name) = raw.strip_prefix('{').and_then(|r| r.strip_suffix('}')) {
                placeholders.push(name.to_string());
                continue;
            }
            let word = raw.to_lowercase();
            if !is_stopword(&word) && !words.contains(&word) {
                words.push(word);
            }
        }

        Self {
            text: text.to_string(),
            words,
            placeholders,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Matchable words: lowercase, de-duplicated, stopwords removed
    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn placeholders(&self) -> &[String] {
        &self.placeholders
    }
}

/// A registered intent. Immutable once registered.
#[derive(Debug, Clone, PartialEq)]
pub struct IntentPattern {
    id: String,
    category: IntentCategory,
    description: String,
    triggers: Vec<TriggerTemplate>,
    required: Vec<SlotSpec>,
    optional: Vec<SlotSpec>,
}

impl IntentPattern {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn category(&self) -> IntentCategory {
        self.category
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn triggers(&self) -> &[TriggerTemplate] {
        &self.triggers
    }

    pub fn required_slots(&self) -> &[SlotSpec] {
        &self.required
    }

    pub fn optional_slots(&self) -> &[SlotSpec] {
        &self.optional
    }
}

/// Slot declaration as written in a registry table
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SlotDef {
    pub name: String,
    #[serde(rename = "type")]
    pub slot_type: SlotType,
    #[serde(default)]
    pub default: Option<String>,
}

/// Intent record as written in a registry table
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IntentDef {
    pub id: String,
    pub category: IntentCategory,
    pub description: String,
    pub triggers: Vec<String>,
    #[serde(default)]
    pub required: Vec<SlotDef>,
    #[serde(default)]
    pub optional: Vec<SlotDef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RegistryTable {
    version: u32,
    #[serde(default)]
    intents: Vec<IntentDef>,
}

impl From<&BuiltinIntent> for IntentDef {
    fn from(b: &BuiltinIntent) -> Self {
        let slot = |&(name, slot_type, default): &(&str, SlotType, Option<&str>)| SlotDef {
            name: name.to_string(),
            slot_type,
            default: default.map(str::to_string),
        };
        IntentDef {
            id: b.id.to_string(),
            category: b.category,
            description: b.description.to_string(),
            triggers: b.triggers.iter().map(|t| t.to_string()).collect(),
            required: b.required.iter().map(slot).collect(),
            optional: b.optional.iter().map(slot).collect(),
        }
    }
}

/// Accumulates validated intents in registration order
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    patterns: Vec<IntentPattern>,
    index: AHashMap<String, usize>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and append one intent.
    pub fn register(&mut self, def: IntentDef) -> Result<&mut Self, RegistryError> {
        if self.index.contains_key(&def.id) {
            return Err(RegistryError::DuplicateIntent(def.id));
        }
        let pattern = compile(def)?;
        self.index.insert(pattern.id.clone(), self.patterns.len());
        self.patterns.push(pattern);
        Ok(self)
    }

    /// Append every intent from the builtin table.
    pub fn with_builtins(&mut self) -> Result<&mut Self, RegistryError> {
        for builtin in BUILTIN_INTENTS {
            self.register(IntentDef::from(builtin))?;
        }
        Ok(self)
    }

    /// Append user-defined intents from a TOML table:
    ///
    /// ```toml
    /// version = 1
    ///
    /// [[intents]]
    /// id = "open-editor"
    /// category = "system-op"
    /// description = "Open a file in the editor"
    /// triggers = ["edit {path}", "open editor on {path}"]
    /// required = [{ name = "path", type = "path" }]
    /// ```
    pub fn extend_from_toml(&mut self, source: &str) -> Result<&mut Self, RegistryError> {
        let table: RegistryTable = toml::from_str(source)?;
        if table.version != BUILTIN_TABLE_VERSION {
            return Err(RegistryError::UnsupportedVersion(table.version));
        }
        for def in table.intents {
            self.register(def)?;
        }
        Ok(self)
    }

    pub fn build(&mut self) -> IntentRegistry {
        let registry = IntentRegistry {
            patterns: std::mem::take(&mut self.patterns),
            index: std::mem::take(&mut self.index),
        };
        tracing::info!(intents = registry.len(), "intent registry built");
        registry
    }
}

fn compile(def: IntentDef) -> Result<IntentPattern, RegistryError> {
    let IntentDef {
        id,
        category,
        description,
        triggers,
        required,
        optional,
    } = def;

    let valid_id = !id.is_empty()
        && !id.starts_with('-')
        && !id.ends_with('-')
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !valid_id {
        return Err(RegistryError::InvalidIdentifier(id));
    }
    if triggers.is_empty() {
        return Err(RegistryError::NoTriggers(id));
    }

    let mut seen_slots: Vec<&str> = Vec::new();
    for slot in required.iter().chain(optional.iter()) {
        if seen_slots.contains(&slot.name.as_str()) {
            return Err(RegistryError::DuplicateSlot {
                intent: id,
                slot: slot.name.clone(),
            });
        }
        seen_slots.push(&slot.name);
    }

    let mut templates = Vec::with_capacity(triggers.len());
    for trigger in &triggers {
        let template = TriggerTemplate::parse(trigger);
        if template.words.is_empty() {
            return Err(RegistryError::EmptyTrigger {
                intent: id,
                trigger: trigger.clone(),
            });
        }
        if let Some(unknown) = template
            .placeholders
            .iter()
            .find(|p| !seen_slots.contains(&p.as_str()))
        {
            return Err(RegistryError::UnknownPlaceholder {
                intent: id,
                trigger: trigger.clone(),
                slot: unknown.clone(),
            });
        }
        templates.push(template);
    }

    let spec = |def: SlotDef| -> Result<SlotSpec, RegistryError> {
        let default = match def.default {
            Some(raw) => Some(validate_value(def.slot_type, &raw).map_err(|source| {
                RegistryError::InvalidDefault {
                    intent: id.clone(),
                    slot: def.name.clone(),
                    source,
                }
            })?),
            None => None,
        };
        Ok(SlotSpec {
            name: def.name,
            slot_type: def.slot_type,
            default,
        })
    };

    let required = required.into_iter().map(&spec).collect::<Result<Vec<_>, _>>()?;
    let optional = optional.into_iter().map(&spec).collect::<Result<Vec<_>, _>>()?;

    Ok(IntentPattern {
        id,
        category,
        description,
        triggers: templates,
        required,
        optional,
    })
}

/// Read-only table of every known intent
#[derive(Debug)]
pub struct IntentRegistry {
    patterns: Vec<IntentPattern>,
    index: AHashMap<String, usize>,
}

impl IntentRegistry {
    /// The builtin file, system and git intents.
    pub fn builtin() -> Result<Self, RegistryError> {
        Ok(RegistryBuilder::new().with_builtins()?.build())
    }

    /// Every pattern in registration order
    pub fn list_patterns(&self) -> &[IntentPattern] {
        &self.patterns
    }

    pub fn get(&self, id: &str) -> Option<&IntentPattern> {
        self.index.get(id).map(|&i| &self.patterns[i])
    }

    /// Registration position of an intent, used as the final tie-break
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
