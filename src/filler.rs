//! Slot filling
//!
//! Binds extracted entities to the slots of a candidate intent. A required
//! slot that cannot be bound demotes the candidate; it is never a hard
//! failure of the pipeline.

use thiserror::Error;

use crate::error::SlotError;
use crate::registry::SlotSpec;
use crate::types::{CandidateMatch, Entity, Slot, SlotType, SlotValue};

/// Why a candidate dropped out of contention
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FillError {
    #[error("intent '{intent}' is missing required {slot_type} slot '{slot}'")]
    MissingRequired {
        intent: String,
        slot: String,
        slot_type: SlotType,
    },
}

/// Validate a raw string as a value of `slot_type`.
pub fn validate_value(slot_type: SlotType, raw: &str) -> Result<SlotValue, SlotError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(SlotError::Empty);
    }

    match slot_type {
        SlotType::Path => {
            if raw.chars().any(char::is_control) {
                return Err(SlotError::ControlCharacter);
            }
            Ok(SlotValue::path(raw))
        }
        SlotType::Identifier => {
            let valid = raw
                .chars()
                .all(|c| c.is_alphanumeric() || c == '-' || c == '_');
            if !valid {
                return Err(SlotError::InvalidIdentifier(raw.to_string()));
            }
            Ok(SlotValue::identifier(raw))
        }
        SlotType::Quantity => parse_quantity(raw),
        SlotType::FreeText => Ok(SlotValue::text(raw)),
    }
}

/// `10`, `2.5`, `100mb`, `5 GB`, `75%`
fn parse_quantity(raw: &str) -> Result<SlotValue, SlotError> {
    let split = raw
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(raw.len());
    let (number, unit) = raw.split_at(split);
    let unit = unit.trim();

    let amount: f64 = number
        .parse()
        .map_err(|_| SlotError::NotAQuantity(raw.to_string()))?;
    let unit_ok = unit.chars().all(|c| c.is_alphabetic() || c == '%');
    if !amount.is_finite() || amount < 0.0 || !unit_ok {
        return Err(SlotError::NotAQuantity(raw.to_string()));
    }

    Ok(SlotValue::Quantity {
        amount,
        unit: (!unit.is_empty()).then(|| unit.to_lowercase()),
    })
}

/// How well an extracted entity fits a slot: 0 is an exact type match,
/// 1 a compatible one, `None` incompatible.
fn compatibility(slot: SlotType, entity: SlotType) -> Option<u8> {
    use SlotType::*;
    match (slot, entity) {
        (a, b) if a == b => Some(0),
        (Quantity, _) | (_, Quantity) => None,
        _ => Some(1),
    }
}

/// How many of `specs` could be bound at once, each by its own entity.
///
/// Slots are taken in declaration order; each picks the best-ranked unused
/// entity that validates, as [`SlotFiller::fill`] does.
pub fn count_satisfiable(specs: &[SlotSpec], entities: &[Entity]) -> usize {
    let mut used = vec![false; entities.len()];
    let mut count = 0;

    for spec in specs {
        let best = entities
            .iter()
            .enumerate()
            .filter(|(i, _)| !used[*i])
            .filter_map(|(i, e)| {
                let rank = compatibility(spec.slot_type(), e.kind)?;
                validate_value(spec.slot_type(), &e.original).ok()?;
                Some((rank, e.start, i))
            })
            .min();
        if let Some((_, _, i)) = best {
            used[i] = true;
            count += 1;
        }
    }
    count
}

/// Byte gap between an entity and the closest anchor span.
fn anchor_distance(entity: &Entity, anchors: &[(usize, usize)]) -> usize {
    anchors
        .iter()
        .map(|&(start, end)| {
            if entity.start >= end {
                entity.start - end
            } else if start >= entity.end {
                start - entity.end
            } else {
                0
            }
        })
        .min()
        .unwrap_or(entity.start)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SlotFiller;

impl SlotFiller {
    pub fn new() -> Self {
        Self
    }

    /// Bind required slots, then optional ones, in declaration order.
    ///
    /// Each entity binds at most one slot. Among compatible entities the
    /// exact type match wins, then the one nearest the matched trigger words,
    /// then the earliest.
    pub fn fill(
        &self,
        candidate: &mut CandidateMatch<'_>,
        entities: &[Entity],
    ) -> Result<(), FillError> {
        let pattern = candidate.pattern;
        let mut used = vec![false; entities.len()];
        let mut bindings = Vec::new();

        for spec in pattern.required_slots() {
            match Self::bind(spec, entities, &candidate.anchors, &mut used) {
                Some(slot) => bindings.push(slot),
                None => {
                    return Err(FillError::MissingRequired {
                        intent: pattern.id().to_string(),
                        slot: spec.name().to_string(),
                        slot_type: spec.slot_type(),
                    })
                }
            }
        }

        for spec in pattern.optional_slots() {
            if let Some(slot) = Self::bind(spec, entities, &candidate.anchors, &mut used) {
                bindings.push(slot);
            } else if let Some(default) = spec.default_value() {
                bindings.push(Slot {
                    name: spec.name().to_string(),
                    slot_type: spec.slot_type(),
                    raw: default.to_string(),
                    value: Some(default.clone()),
                    span: None,
                });
            }
        }

        candidate.bindings = bindings;
        Ok(())
    }

    fn bind(
        spec: &SlotSpec,
        entities: &[Entity],
        anchors: &[(usize, usize)],
        used: &mut [bool],
    ) -> Option<Slot> {
        let mut ranked: Vec<(u8, usize, usize, usize)> = entities
            .iter()
            .enumerate()
            .filter(|(i, _)| !used[*i])
            .filter_map(|(i, e)| {
                let rank = compatibility(spec.slot_type(), e.kind)?;
                Some((rank, anchor_distance(e, anchors), e.start, i))
            })
            .collect();
        ranked.sort_unstable();

        for (_, _, _, i) in ranked {
            let entity = &entities[i];
            match validate_value(spec.slot_type(), &entity.original) {
                Ok(value) => {
                    used[i] = true;
                    return Some(Slot {
                        name: spec.name().to_string(),
                        slot_type: spec.slot_type(),
                        raw: entity.original.clone(),
                        value: Some(value),
                        span: Some((entity.start, entity.end)),
                    });
                }
                Err(err) => {
                    tracing::trace!(
                        slot = spec.name(),
                        value = %entity.original,
                        %err,
                        "entity rejected for slot"
                    );
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::IntentRegistry;
    use crate::types::Recognizer;

    fn entity(kind: SlotType, text: &str, start: usize) -> Entity {
        Entity::new(
            kind,
            text.to_lowercase(),
            text.to_string(),
            start,
            start + text.len(),
            Recognizer::PathLike,
        )
    }

    fn candidate<'r>(
        registry: &'r IntentRegistry,
        id: &str,
        anchors: Vec<(usize, usize)>,
    ) -> CandidateMatch<'r> {
        let pattern = registry.get(id).unwrap();
        CandidateMatch {
            pattern,
            score: 1.0,
            trigger: pattern.triggers()[0].text(),
            anchors,
            satisfiable: 0,
            registry_index: registry.position(id).unwrap(),
            bindings: Vec::new(),
        }
    }

    #[test]
    fn test_validate_path() {
        assert_eq!(
            validate_value(SlotType::Path, "src/Main.rs"),
            Ok(SlotValue::path("src/Main.rs"))
        );
        assert_eq!(
            validate_value(SlotType::Path, "bad\u{7}name"),
            Err(SlotError::ControlCharacter)
        );
        assert_eq!(validate_value(SlotType::Path, "  "), Err(SlotError::Empty));
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_value(SlotType::Identifier, "feature_x-2").is_ok());
        assert!(matches!(
            validate_value(SlotType::Identifier, "test.txt"),
            Err(SlotError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn test_validate_quantity() {
        assert_eq!(
            validate_value(SlotType::Quantity, "5 GB"),
            Ok(SlotValue::Quantity { amount: 5.0, unit: Some("gb".to_string()) })
        );
        assert_eq!(
            validate_value(SlotType::Quantity, "10"),
            Ok(SlotValue::Quantity { amount: 10.0, unit: None })
        );
        assert!(validate_value(SlotType::Quantity, "-3").is_err());
        assert!(validate_value(SlotType::Quantity, "many").is_err());
        assert!(validate_value(SlotType::Quantity, "1.2.3").is_err());
    }

    #[test]
    fn test_fill_required_and_default() {
        let registry = IntentRegistry::builtin().unwrap();
        let mut c = candidate(&registry, "find-large-files", vec![(0, 4)]);
        let entities = vec![entity(SlotType::Quantity, "100mb", 27)];
        SlotFiller::new().fill(&mut c, &entities).unwrap();
        let values = c.slot_values();
        assert_eq!(
            values.get("size"),
            Some(&SlotValue::Quantity { amount: 100.0, unit: Some("mb".to_string()) })
        );
        assert_eq!(values.get("path"), Some(&SlotValue::path(".")));
    }

    #[test]
    fn test_missing_required_demotes() {
        let registry = IntentRegistry::builtin().unwrap();
        let mut c = candidate(&registry, "change-directory", vec![(0, 2)]);
        let err = SlotFiller::new().fill(&mut c, &[]).unwrap_err();
        assert!(matches!(err, FillError::MissingRequired { slot, .. } if slot == "path"));
    }

    #[test]
    fn test_quantity_never_binds_path() {
        let registry = IntentRegistry::builtin().unwrap();
        let mut c = candidate(&registry, "change-directory", vec![(0, 2)]);
        let entities = vec![entity(SlotType::Quantity, "5", 3)];
        assert!(SlotFiller::new().fill(&mut c, &entities).is_err());
    }

    #[test]
    fn test_nearest_entity_binds_first_slot() {
        // "copy a.txt to b.txt"
        let registry = IntentRegistry::builtin().unwrap();
        let mut c = candidate(&registry, "copy-file", vec![(0, 4)]);
        let entities = vec![
            entity(SlotType::Path, "a.txt", 5),
            entity(SlotType::Path, "b.txt", 14),
        ];
        SlotFiller::new().fill(&mut c, &entities).unwrap();
        let values = c.slot_values();
        assert_eq!(values.get("source"), Some(&SlotValue::path("a.txt")));
        assert_eq!(values.get("destination"), Some(&SlotValue::path("b.txt")));
    }

    #[test]
    fn test_exact_type_preferred_over_nearer_compatible() {
        // "search for 'todo' in notes.md": text slot takes the quoted literal
        let registry = IntentRegistry::builtin().unwrap();
        let mut c = candidate(&registry, "search-text", vec![(0, 6)]);
        let entities = vec![
            entity(SlotType::Path, "notes.md", 7),
            entity(SlotType::FreeText, "todo", 30),
        ];
        SlotFiller::new().fill(&mut c, &entities).unwrap();
        let values = c.slot_values();
        assert_eq!(values.get("text"), Some(&SlotValue::text("todo")));
        assert_eq!(values.get("path"), Some(&SlotValue::path("notes.md")));
    }

    #[test]
    fn test_invalid_entity_skipped_for_next() {
        let registry = IntentRegistry::builtin().unwrap();
        let mut c = candidate(&registry, "kill-process", vec![(0, 4)]);
        let entities = vec![
            entity(SlotType::Path, "some/path", 5),
            entity(SlotType::Path, "firefox", 20),
        ];
        SlotFiller::new().fill(&mut c, &entities).unwrap();
        assert_eq!(c.slot_values().get("process"), Some(&SlotValue::identifier("firefox")));
    }

    #[test]
    fn test_count_satisfiable() {
        let registry = IntentRegistry::builtin().unwrap();
        let kill = registry.get("kill-process").unwrap().required_slots();
        assert_eq!(count_satisfiable(kill, &[entity(SlotType::Path, "a/b", 0)]), 0);
        assert_eq!(count_satisfiable(kill, &[entity(SlotType::Identifier, "top", 0)]), 1);
    }

    #[test]
    fn test_count_satisfiable_uses_each_entity_once() {
        let registry = IntentRegistry::builtin().unwrap();
        let copy = registry.get("copy-file").unwrap().required_slots();
        let one = [entity(SlotType::Path, "a.txt", 5)];
        assert_eq!(count_satisfiable(copy, &one), 1);

        let two = [entity(SlotType::Path, "a.txt", 5), entity(SlotType::Path, "b.txt", 15)];
        assert_eq!(count_satisfiable(copy, &two), 2);
    }
}
