//! N-gram shingling and overlap scoring
//!
//! Text is normalized before shingling:
//! - lowercased
//! - every whitespace run collapsed to a single `*`
//! - wrapped in a leading and trailing `*`
//!
//! Boundary markers make word starts and ends part of the grams.
//!
//! Similarity is `|A ∩ B| / max(|A|, |B|)`. The denominator is the larger
//! set, NOT the union: a short query fully contained in a long field scores
//! high. Ranking depends on this; do not swap it for Jaccard.

use rustc_hash::FxHashSet;

/// Default shingle length (trigrams).
pub const DEFAULT_NGRAM_SIZE: usize = 3;

/// Boundary and word delimiter inserted by normalization.
pub const BOUNDARY: char = '*';

/// Deduplicated n-grams of one string.
pub type NgramSet = FxHashSet<String>;

/// Normalize text for shingling: lowercase, whitespace runs -> `*`, padded.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push(BOUNDARY);

    let mut in_whitespace = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                out.push(BOUNDARY);
            }
            in_whitespace = true;
        } else {
            in_whitespace = false;
            out.extend(ch.to_lowercase());
        }
    }

    out.push(BOUNDARY);
    out
}

/// All n-grams of `text`, in order, duplicates included.
///
/// Windows slide over characters from 0 to `len - n` inclusive. Text whose
/// normalized form is shorter than `n` (and `n == 0`) yields nothing.
pub fn shingles(text: &str, n: usize) -> Vec<String> {
    if n == 0 {
        return Vec::new();
    }

    let chars: Vec<char> = normalize(text).chars().collect();
    if chars.len() < n {
        return Vec::new();
    }

    chars.windows(n).map(|w| w.iter().collect()).collect()
}

/// Trigrams of `text`.
pub fn trigrams(text: &str) -> Vec<String> {
    shingles(text, DEFAULT_NGRAM_SIZE)
}

/// The n-gram set of `text` (membership only).
pub fn ngram_set(text: &str, n: usize) -> NgramSet {
    shingles(text, n).into_iter().collect()
}

/// Overlap score in [0, 1]: intersection size over the larger set's size.
///
/// Two empty sets score 0.
pub fn similarity(a: &NgramSet, b: &NgramSet) -> f64 {
    let denominator = a.len().max(b.len());
    if denominator == 0 {
        return 0.0;
    }

    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let shared = small.iter().filter(|g| large.contains(*g)).count();

    shared as f64 / denominator as f64
}

/// Score two strings directly. Convenience for one-off comparisons.
pub fn text_similarity(a: &str, b: &str, n: usize) -> f64 {
    similarity(&ngram_set(a, n), &ngram_set(b, n))
}
