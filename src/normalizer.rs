//! Input normalization
//!
//! Lowercases, replaces punctuation that carries no meaning for matching
//! with spaces, drops sentence-final dots and collapses whitespace. Every
//! byte of the normalized text keeps a pointer back to the character it
//! came from so extracted spans can be rehydrated with their original
//! casing (filenames, quoted literals).

use crate::error::ResolveError;

/// Punctuation that survives normalization because paths, globs, flags,
/// quantities and quoted literals depend on it.
const KEPT_PUNCTUATION: &[char] = &[
    '/', '\\', '.', '-', '_', '~', ':', '"', '\'', '*', '%', '@', '+', '=',
];

/// Words that carry no weight when comparing a phrase against triggers.
pub const STOPWORDS: &[&str] = &[
    "a", "an", "the", "me", "my", "i", "you", "your", "we", "us", "it", "its", "all", "any",
    "some", "this", "that", "these", "those", "here", "there", "in", "into", "inside", "on", "at",
    "of", "to", "for", "from", "with", "as", "by", "than", "is", "are", "be", "am", "please",
    "can", "could", "would", "will", "should", "want", "wanna", "let", "lets", "just", "now",
    "then", "and", "or", "called", "named", "titled", "do", "does", "what", "whats", "which",
];

pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word)
}

/// Normalized input plus the map back to the original text
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedText {
    text: String,
    original: String,
    /// For each byte of `text`: the byte range of its source character.
    sources: Vec<(usize, usize)>,
}

impl NormalizedText {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    /// Original text behind the normalized byte range `start..end`.
    ///
    /// Returns `None` for empty or out-of-range spans.
    pub fn rehydrate(&self, start: usize, end: usize) -> Option<&str> {
        if start >= end || end > self.sources.len() {
            return None;
        }
        let from = self.sources[start].0;
        let to = self.sources[end - 1].1;
        self.original.get(from..to)
    }

    /// Whitespace-separated words with their byte spans
    pub fn words(&self) -> impl Iterator<Item = (usize, usize, &str)> + '_ {
        let text = self.text.as_str();
        text.split(' ').scan(0usize, move |offset, word| {
            let start = *offset;
            *offset += word.len() + 1;
            Some((start, start + word.len(), word))
        })
    }
}

/// A character of the output paired with the original range it came from.
/// `None` marks a word boundary.
type Mapped = Option<(char, (usize, usize))>;

/// Normalize raw user input.
///
/// Fails with [`ResolveError::EmptyInput`] when nothing is left to match.
pub fn normalize(raw: &str) -> Result<NormalizedText, ResolveError> {
    let mut mapped: Vec<Mapped> = Vec::with_capacity(raw.len());

    for (idx, ch) in raw.char_indices() {
        let source = (idx, idx + ch.len_utf8());
        if ch.is_whitespace() || ch.is_control() {
            mapped.push(None);
        } else if ch.is_alphanumeric() || KEPT_PUNCTUATION.contains(&ch) {
            for lower in ch.to_lowercase() {
                mapped.push(Some((lower, source)));
            }
        } else {
            mapped.push(None);
        }
    }

    strip_trailing_dots(&mut mapped);

    let mut text = String::with_capacity(mapped.len());
    let mut sources = Vec::with_capacity(mapped.len());
    let mut pending_space: Option<(usize, usize)> = None;
    let mut last_source = (0, 0);

    for item in mapped {
        match item {
            None => {
                if !text.is_empty() && pending_space.is_none() {
                    pending_space = Some(last_source);
                }
            }
            Some((ch, source)) => {
                if let Some(space_source) = pending_space.take() {
                    text.push(' ');
                    sources.push(space_source);
                }
                text.push(ch);
                sources.extend(std::iter::repeat(source).take(ch.len_utf8()));
                last_source = source;
            }
        }
    }

    if text.is_empty() {
        return Err(ResolveError::EmptyInput);
    }

    Ok(NormalizedText {
        text,
        original: raw.to_string(),
        sources,
    })
}

/// Drop sentence punctuation dots ("delete test.txt." -> "test.txt") while
/// leaving dot-only words such as `..` and inner dots alone.
fn strip_trailing_dots(mapped: &mut [Mapped]) {
    let mut i = 0;
    while i < mapped.len() {
        if mapped[i].is_none() {
            i += 1;
            continue;
        }
        let start = i;
        while i < mapped.len() && mapped[i].is_some() {
            i += 1;
        }
        let word = &mut mapped[start..i];
        let has_content = word
            .iter()
            .any(|c| matches!(c, Some((ch, _)) if *ch != '.'));
        if has_content {
            for slot in word.iter_mut().rev() {
                match slot {
                    Some(('.', _)) => *slot = None,
                    _ => break,
                }
            }
        }
    }
}
