//! Compound phrase splitting
//!
//! "create a folder called logs and then go to logs" is two commands. Each
//! stage is resolved on its own; nothing flows between stages.

use regex::Regex;

use crate::error::ResolveError;
use crate::types::Outcome;

/// Sequencing connectors, longest first so "and then" wins over "and"
const CONNECTORS: &[&str] = &["and then", "after that", "followed by", "then", "and"];

/// One stage of a compound phrase with its own outcome
#[derive(Debug)]
pub struct SequenceStage {
    pub text: String,
    pub outcome: Result<Outcome, ResolveError>,
}

pub struct StageSplitter {
    connector: Regex,
}

impl StageSplitter {
    pub fn new() -> Self {
        let alternatives: Vec<String> = CONNECTORS
            .iter()
            .map(|c| regex::escape(c).replace(' ', r"\s+"))
            .collect();
        // Connectors stand alone: "src/and/main.rs" and "then.log" are not split
        let pattern = format!(r"(?i)(?:^|[\s,;])({})(?:[\s,;]|$)", alternatives.join("|"));
        Self {
            connector: Regex::new(&pattern).expect("Invalid regex pattern"),
        }
    }

    /// Split on connectors outside quoted literals.
    ///
    /// Stages keep their original casing; empty stages are dropped.
    pub fn split<'a>(&self, raw: &'a str) -> Vec<&'a str> {
        let quoted = quoted_spans(raw);
        let mut stages = Vec::new();
        let mut start = 0;

        for cap in self.connector.captures_iter(raw) {
            let (Some(whole), Some(word)) = (cap.get(0), cap.get(1)) else {
                continue;
            };
            if quoted.iter().any(|&(qs, qe)| word.start() >= qs && word.start() < qe) {
                continue;
            }
            stages.push(&raw[start..whole.start()]);
            start = whole.end();
        }
        stages.push(&raw[start..]);

        stages
            .into_iter()
            .map(|s| {
                s.trim()
                    .trim_end_matches(|c: char| c == ',' || c == ';' || c == '.')
                    .trim()
            })
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn is_compound(&self, raw: &str) -> bool {
        self.split(raw).len() > 1
    }
}

impl Default for StageSplitter {
    fn default() -> Self {
        Self::new()
    }
}

/// Byte spans of balanced `"..."` and `'...'` literals
fn quoted_spans(raw: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut open: Option<(char, usize)> = None;

    for (i, c) in raw.char_indices() {
        match open {
            Some((q, start)) if c == q => {
                spans.push((start, i + 1));
                open = None;
            }
            Some(_) => {}
            None if c == '"' => open = Some((c, i)),
            // Apostrophes inside words ("don't") do not open a literal
            None if c == '\'' && raw[..i].chars().last().map_or(true, char::is_whitespace) => {
                open = Some((c, i))
            }
            None => {}
        }
    }
    spans
}
