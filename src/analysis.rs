//! Linguistic analysis adapter (consumer side)
//!
//! The resolver only depends on the [`LinguisticAnalyzer`] contract. A real
//! deployment plugs in a tagger service; [`LexiconAnalyzer`] is a small
//! offline stand-in driven by word lists, good enough for terminal phrases
//! and for tests.

use ahash::AHashMap;

use crate::error::AnalysisError;
use crate::types::{PosTag, Token};

/// Tags tokens and named entities in normalized text
pub trait LinguisticAnalyzer: Send + Sync {
    /// Tokenize and tag `text`. Token offsets must index into `text`.
    fn analyze(&self, text: &str) -> Result<Vec<Token>, AnalysisError>;
}

impl<T: LinguisticAnalyzer + ?Sized> LinguisticAnalyzer for Box<T> {
    fn analyze(&self, text: &str) -> Result<Vec<Token>, AnalysisError> {
        (**self).analyze(text)
    }
}

impl<T: LinguisticAnalyzer + ?Sized> LinguisticAnalyzer for std::sync::Arc<T> {
    fn analyze(&self, text: &str) -> Result<Vec<Token>, AnalysisError> {
        (**self).analyze(text)
    }
}

/// Check that every token span lies on char boundaries inside `text` and
/// that spans come in text order without overlapping.
pub fn validate_tokens(text: &str, tokens: &[Token]) -> Result<(), AnalysisError> {
    let mut previous_end = 0;
    for token in tokens {
        let valid = token.start < token.end
            && token.end <= text.len()
            && text.is_char_boundary(token.start)
            && text.is_char_boundary(token.end);
        if !valid {
            return Err(AnalysisError::MalformedToken {
                surface: token.surface.clone(),
                start: token.start,
                end: token.end,
            });
        }
        if token.start < previous_end {
            return Err(AnalysisError::OutOfOrder {
                surface: token.surface.clone(),
                start: token.start,
                previous_end,
            });
        }
        previous_end = token.end;
    }
    Ok(())
}

const DETERMINERS: &[&str] = &[
    "a", "an", "the", "this", "that", "these", "those", "all", "every", "each", "some", "any",
];
const PRONOUNS: &[&str] = &["i", "me", "my", "you", "your", "it", "its", "we", "us", "what"];
const ADPOSITIONS: &[&str] = &[
    "in", "into", "inside", "to", "from", "of", "on", "at", "for", "with", "by", "as", "than",
    "under",
];
const CONJUNCTIONS: &[&str] = &["and", "or", "then"];
const ADJECTIVES: &[&str] = &[
    "new", "current", "working", "empty", "large", "larger", "big", "bigger", "small", "smaller",
    "parent", "old", "recent", "last", "running", "free", "hidden", "latest",
];
const VERBS: &[&str] = &[
    "list", "show", "display", "print", "create", "make", "delete", "remove", "erase", "trash",
    "copy", "duplicate", "move", "rename", "change", "go", "enter", "switch", "find", "search",
    "open", "read", "kill", "stop", "end", "check", "commit", "push", "pull", "checkout", "touch",
    "save", "called", "named", "cat", "ls", "cd", "mkdir", "rm", "rmdir", "cp", "mv", "grep",
];
const ADVERBS: &[&str] = &["permanently", "now", "here", "there", "up", "please", "just"];

/// Word-list part-of-speech tagger
#[derive(Debug, Clone, Default)]
pub struct LexiconAnalyzer {
    entities: AHashMap<String, String>, // lowercase word -> NER label
}

impl LexiconAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a known named entity (e.g. a process or branch name).
    pub fn with_entity(mut self, word: &str, label: &str) -> Self {
        self.entities.insert(word.to_lowercase(), label.to_string());
        self
    }

    fn tag(word: &str) -> PosTag {
        let bare = word.trim_matches(|c| c == '"' || c == '\'');
        if bare.is_empty() {
            return PosTag::Punct;
        }
        if bare.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            return PosTag::Num;
        }
        if DETERMINERS.contains(&bare) {
            PosTag::Det
        } else if PRONOUNS.contains(&bare) {
            PosTag::Pron
        } else if ADPOSITIONS.contains(&bare) {
            PosTag::Adp
        } else if CONJUNCTIONS.contains(&bare) {
            PosTag::Cconj
        } else if ADJECTIVES.contains(&bare) {
            PosTag::Adj
        } else if VERBS.contains(&bare) {
            PosTag::Verb
        } else if ADVERBS.contains(&bare) {
            PosTag::Adv
        } else if bare.chars().all(|c| c.is_alphanumeric()) {
            PosTag::Noun
        } else {
            PosTag::X
        }
    }
}

impl LinguisticAnalyzer for LexiconAnalyzer {
    fn analyze(&self, text: &str) -> Result<Vec<Token>, AnalysisError> {
        let mut tokens = Vec::new();
        let mut offset = 0;

        for word in text.split(' ') {
            if !word.is_empty() {
                let mut token = Token::new(word, Self::tag(word), offset);
                if let Some(label) = self.entities.get(&token.normalized) {
                    token.pos = PosTag::Propn;
                    token.ner = Some(label.clone());
                }
                tokens.push(token);
            }
            offset += word.len() + 1;
        }

        Ok(tokens)
    }
}
