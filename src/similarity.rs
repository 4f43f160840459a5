//! Fast string similarity calculation
//!
//! Word-level edit distance aggregated over a one-to-one alignment of two
//! word sets. Order-insensitive and case-insensitive, tolerant of typos
//! inside individual words.

use ahash::AHashSet;

/// One input word paired with one trigger word
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignedPair {
    pub input_index: usize,
    pub trigger_index: usize,
    pub ratio: f64,
}

/// Best alignment between an input word set and a trigger word set
#[derive(Debug, Clone, PartialEq)]
pub struct TokenAlignment {
    pub score: f64,
    pub pairs: Vec<AlignedPair>,
}

/// Levenshtein edit distance over chars
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    let n = b_chars.len();
    if a_chars.is_empty() {
        return n;
    }

    // Dynamic programming with two rows
    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0; n + 1];

    for (i, ca) in a_chars.iter().enumerate() {
        curr[0] = i + 1;
        for j in 1..=n {
            let cost = usize::from(*ca != b_chars[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

/// Normalized Levenshtein ratio in [0, 1]: `1 - distance / longer length`
pub fn levenshtein_ratio(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / longest as f64
}

/// Lowercase and de-duplicate words, keeping first occurrence order.
pub fn word_set<'a, I>(words: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = AHashSet::new();
    words
        .into_iter()
        .map(str::to_lowercase)
        .filter(|w| !w.is_empty() && seen.insert(w.clone()))
        .collect()
}

/// Align two word sets and score them (0.0-1.0).
///
/// Pairs are taken greedily, highest ratio first, each word used at most
/// once; pairs below `token_floor` never align. The score is
/// `2 * sum(ratios) / (|input| + |trigger|)`.
pub fn align_tokens(input: &[String], trigger: &[String], token_floor: f64) -> TokenAlignment {
    let total = input.len() + trigger.len();
    if input.is_empty() || trigger.is_empty() {
        return TokenAlignment {
            score: 0.0,
            pairs: Vec::new(),
        };
    }

    let mut candidates = Vec::with_capacity(input.len() * trigger.len());
    for (i, word) in input.iter().enumerate() {
        for (j, pattern_word) in trigger.iter().enumerate() {
            // Fast path: identical words
            let ratio = if word == pattern_word {
                1.0
            } else {
                levenshtein_ratio(word, pattern_word)
            };
            if ratio >= token_floor {
                candidates.push(AlignedPair {
                    input_index: i,
                    trigger_index: j,
                    ratio,
                });
            }
        }
    }

    candidates.sort_by(|a, b| {
        b.ratio
            .total_cmp(&a.ratio)
            .then(a.input_index.cmp(&b.input_index))
            .then(a.trigger_index.cmp(&b.trigger_index))
    });

    let mut used_input = vec![false; input.len()];
    let mut used_trigger = vec![false; trigger.len()];
    let mut pairs = Vec::new();
    let mut matched = 0.0;

    for pair in candidates {
        if used_input[pair.input_index] || used_trigger[pair.trigger_index] {
            continue;
        }
        used_input[pair.input_index] = true;
        used_trigger[pair.trigger_index] = true;
        matched += pair.ratio;
        pairs.push(pair);
    }

    TokenAlignment {
        score: (2.0 * matched / total as f64).clamp(0.0, 1.0),
        pairs,
    }
}

/// Score two phrases directly (whitespace-split, case-insensitive)
pub fn calculate_similarity(input: &str, pattern: &str, token_floor: f64) -> f64 {
    let input_words = word_set(input.split_whitespace());
    let pattern_words = word_set(pattern.split_whitespace());
    align_tokens(&input_words, &pattern_words, token_floor).score
}
