//! Entity extraction from normalized input
//!
//! Recognizers run as layers in a fixed priority order over the tagged
//! tokens. Before a layer accepts a span it checks the set of spans claimed
//! by earlier layers, so the first claim wins by priority rather than by
//! position and no recognizer needs to know about the others.

use regex::Regex;

use crate::normalizer::{is_stopword, NormalizedText};
use crate::types::{Entity, PosTag, Recognizer, SlotType, Token};

const KNOWN_EXTENSIONS: &[&str] = &[
    "txt", "md", "rst", "log", "csv", "tsv", "json", "toml", "yaml", "yml", "xml", "ini", "cfg",
    "conf", "env", "lock", "rs", "py", "js", "ts", "tsx", "jsx", "go", "c", "h", "cpp", "hpp",
    "java", "kt", "rb", "php", "sh", "bash", "zsh", "ps1", "bat", "html", "css", "scss", "sql",
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "jpg", "jpeg", "png", "gif", "svg",
    "mp3", "mp4", "wav", "zip", "tar", "gz", "tgz", "bz2", "xz", "7z", "rar", "exe", "dll",
    "so", "bak", "tmp", "old", "out", "o", "a", "iso", "img",
];

/// Well-known locations and the path they stand for
const LOCATIONS: &[(&str, &str)] = &[
    ("home", "~"),
    ("desktop", "~/Desktop"),
    ("downloads", "~/Downloads"),
    ("documents", "~/Documents"),
    ("pictures", "~/Pictures"),
    ("music", "~/Music"),
    ("videos", "~/Videos"),
    ("temp", "/tmp"),
    ("tmp", "/tmp"),
];

/// Unit words allowed after a bare number ("5 gb")
const UNITS: &[&str] = &[
    "b", "kb", "mb", "gb", "tb", "k", "m", "g", "%", "percent", "bytes", "kilobytes",
    "megabytes", "gigabytes",
];

/// Words after which the next token names something
const NAMING_CUES: &[&str] = &[
    "called", "named", "titled", "branch", "process", "directory", "folder", "dir", "file", "to",
    "cd", "mkdir", "rmdir", "touch", "checkout", "kill", "message",
];

const DIRECTORY_NOUNS: &[&str] = &["directory", "folder", "dir"];

/// Byte spans already claimed by a higher-priority layer
#[derive(Debug, Clone, Default)]
pub struct ClaimSet {
    spans: Vec<(usize, usize)>,
}

impl ClaimSet {
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        self.spans.iter().any(|&(s, e)| start < e && s < end)
    }

    /// Claim a span unless it overlaps an earlier claim.
    pub fn claim(&mut self, start: usize, end: usize) -> bool {
        if self.overlaps(start, end) {
            return false;
        }
        self.spans.push((start, end));
        true
    }
}

/// Everything the extractor found in one input
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Slot candidates ordered by position.
    pub entities: Vec<Entity>,
    /// Option flags such as `-r` or `--force`, in input order.
    pub flags: Vec<String>,
    claimed: ClaimSet,
}

impl Extraction {
    /// Whether a span was consumed by an entity or a flag.
    pub fn is_claimed(&self, start: usize, end: usize) -> bool {
        self.claimed.overlaps(start, end)
    }
}

/// Layered slot recognizer
pub struct EntityExtractor {
    double_quoted: Regex,
    single_quoted: Regex,
    extension: Regex,
    quantity: Regex,
    number: Regex,
    identifier: Regex,
}

impl EntityExtractor {
    pub fn new() -> Self {
        // Compile patterns once - these are literals and never fail
        Self {
            double_quoted: Regex::new(r#""([^"]*)""#).expect("Invalid regex pattern"),
            single_quoted: Regex::new(r"(?:^|\s)('([^']*)')").expect("Invalid regex pattern"),
            extension: Regex::new(r"[^./\\]\.([a-z0-9]{1,5})$").expect("Invalid regex pattern"),
            quantity: Regex::new(r"^(\d+(?:\.\d+)?)(kb|mb|gb|tb|b|k|m|g|%|percent|bytes)?$")
                .expect("Invalid regex pattern"),
            number: Regex::new(r"^\d+(?:\.\d+)?$").expect("Invalid regex pattern"),
            identifier: Regex::new(r"^[a-z0-9_-]+$").expect("Invalid regex pattern"),
        }
    }

    /// Run every recognizer layer over `text` and its tokens.
    pub fn extract(&self, text: &NormalizedText, tokens: &[Token]) -> Extraction {
        let mut out = Extraction::default();

        self.claim_quoted(text, &mut out);
        Self::claim_flags(tokens, &mut out);
        self.claim_paths(text, tokens, &mut out);
        self.claim_identifiers(text, tokens, &mut out);
        self.claim_quantities(text, tokens, &mut out);

        out.entities.sort_by_key(|e| (e.start, e.end));
        out
    }

    /// Layer 1: quoted literals, never re-tokenized.
    fn claim_quoted(&self, text: &NormalizedText, out: &mut Extraction) {
        let s = text.as_str();
        let double = self
            .double_quoted
            .captures_iter(s)
            .filter_map(|cap| Some((cap.get(0)?, cap.get(1)?)));
        let single = self
            .single_quoted
            .captures_iter(s)
            .filter_map(|cap| Some((cap.get(1)?, cap.get(2)?)));

        let mut spans: Vec<_> = double.chain(single).collect();
        spans.sort_by_key(|(whole, _)| whole.start());

        for (whole, inner) in spans {
            if inner.as_str().trim().is_empty() {
                continue;
            }
            if !out.claimed.claim(whole.start(), whole.end()) {
                continue;
            }
            let original = text
                .rehydrate(inner.start(), inner.end())
                .unwrap_or(inner.as_str())
                .to_string();
            let kind = if self.looks_like_path(inner.as_str()) {
                SlotType::Path
            } else {
                SlotType::FreeText
            };
            out.entities.push(Entity::new(
                kind,
                inner.as_str().to_string(),
                original,
                whole.start(),
                whole.end(),
                Recognizer::Quoted,
            ));
        }
    }

    fn claim_flags(tokens: &[Token], out: &mut Extraction) {
        for token in tokens {
            if is_flag(&token.surface) && out.claimed.claim(token.start, token.end) {
                out.flags.push(token.surface.clone());
            }
        }
    }

    /// Layer 2: tokens with separators, known extensions or well-known locations.
    fn claim_paths(&self, text: &NormalizedText, tokens: &[Token], out: &mut Extraction) {
        for token in tokens {
            if out.claimed.overlaps(token.start, token.end) {
                continue;
            }
            let word = token.surface.as_str();

            if self.looks_like_path(word) {
                out.claimed.claim(token.start, token.end);
                let original = text
                    .rehydrate(token.start, token.end)
                    .unwrap_or(word)
                    .to_string();
                out.entities.push(Entity::new(
                    SlotType::Path,
                    word.to_string(),
                    original,
                    token.start,
                    token.end,
                    Recognizer::PathLike,
                ));
            } else if let Some(&(_, location)) = LOCATIONS.iter().find(|(name, _)| *name == word) {
                out.claimed.claim(token.start, token.end);
                out.entities.push(Entity::new(
                    SlotType::Path,
                    location.to_string(),
                    location.to_string(),
                    token.start,
                    token.end,
                    Recognizer::PathLike,
                ));
            }
        }
    }

    /// Layer 3: proper nouns, named entities and cue-introduced names.
    fn claim_identifiers(&self, text: &NormalizedText, tokens: &[Token], out: &mut Extraction) {
        for (i, token) in tokens.iter().enumerate() {
            if out.claimed.overlaps(token.start, token.end) {
                continue;
            }
            let word = token.normalized.as_str();
            if !self.identifier.is_match(word) || is_stopword(word) || NAMING_CUES.contains(&word)
            {
                continue;
            }
            // Numbers belong to the quantity layer even when the tagger labels them
            if token.pos == PosTag::Num || self.quantity.is_match(word) {
                continue;
            }

            let tagged = token.pos == PosTag::Propn || token.ner.is_some();
            let nominal = matches!(token.pos, PosTag::Noun | PosTag::Propn | PosTag::X);
            let after_cue = nominal
                && i > 0
                && NAMING_CUES.contains(&tokens[i - 1].normalized.as_str());
            let before_directory_noun = token.pos == PosTag::Noun
                && !DIRECTORY_NOUNS.contains(&word)
                && tokens
                    .get(i + 1)
                    .is_some_and(|next| DIRECTORY_NOUNS.contains(&next.normalized.as_str()));

            if !(tagged || after_cue || before_directory_noun) {
                continue;
            }

            out.claimed.claim(token.start, token.end);
            let original = text
                .rehydrate(token.start, token.end)
                .unwrap_or(&token.surface)
                .to_string();
            out.entities.push(Entity::new(
                SlotType::Identifier,
                token.surface.clone(),
                original,
                token.start,
                token.end,
                Recognizer::Identifier,
            ));
        }
    }

    /// Layer 4: numbers, optionally with a unit suffix or unit word.
    fn claim_quantities(&self, text: &NormalizedText, tokens: &[Token], out: &mut Extraction) {
        let mut i = 0;
        while i < tokens.len() {
            let token = &tokens[i];
            if out.claimed.overlaps(token.start, token.end)
                || !self.quantity.is_match(&token.surface)
            {
                i += 1;
                continue;
            }

            let mut end = token.end;
            let mut consumed = 1;
            if self.number.is_match(&token.surface) {
                if let Some(unit) = tokens.get(i + 1) {
                    if UNITS.contains(&unit.surface.as_str())
                        && unit.start >= token.end
                        && !out.claimed.overlaps(unit.start, unit.end)
                    {
                        end = unit.end;
                        consumed = 2;
                    }
                }
            }

            out.claimed.claim(token.start, end);
            let value = text.as_str()[token.start..end].to_string();
            let original = text
                .rehydrate(token.start, end)
                .unwrap_or(value.as_str())
                .to_string();
            out.entities.push(Entity::new(
                SlotType::Quantity,
                value,
                original,
                token.start,
                end,
                Recognizer::Quantity,
            ));
            i += consumed;
        }
    }

    /// Separators, globs, home/relative prefixes or a known extension.
    pub fn looks_like_path(&self, word: &str) -> bool {
        if word.is_empty() || is_flag(word) || self.number.is_match(word) {
            return false;
        }
        if word == "." || word == ".." || word == "~" {
            return true;
        }
        if word.contains('/') || word.contains('\\') || word.contains('*') || word.starts_with('~')
        {
            return true;
        }
        // Dotfiles like .gitignore
        if word.len() > 1 && word.starts_with('.') && word[1..].chars().all(|c| c.is_alphanumeric())
        {
            return true;
        }
        self.extension
            .captures(word)
            .and_then(|cap| cap.get(1))
            .is_some_and(|ext| KNOWN_EXTENSIONS.contains(&ext.as_str()))
    }
}

impl Default for EntityExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// `-r`, `--force`, `--depth=2`
fn is_flag(word: &str) -> bool {
    let rest = word.trim_start_matches('-');
    word.starts_with('-')
        && word.len() - rest.len() <= 2
        && rest.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
}
