//! Text segmentation utilities.
//!
//! Provides the word, sentence, and paragraph boundaries used across the
//! crate. Every component that needs to count or compare words goes
//! through [`tokenize_words`] so that the metrics engine and the
//! degeneracy checks agree on what a "word" is.
//!
//! The sentence splitter is deliberately heuristic: it splits after `.`,
//! `!`, or `?` followed by whitespace and will mis-split abbreviations.
//! That approximation is accepted; readability formulas tolerate it.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\w']+").unwrap());

/// A word-bounded slice of a document, processed independently before
/// reduction.
///
/// Ordering is significant: concatenating chunk texts in `index` order
/// reproduces the document's word sequence exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position of this chunk within the document (0-based).
    pub index: usize,
    /// Half-open word range `[start, end)` into the document's word list.
    pub word_range: (usize, usize),
    /// The chunk text, space-joined words.
    pub text: String,
}

/// Split text into word-bounded chunks of at most `max_words` words.
///
/// Produces `ceil(words / max_words)` chunks; every chunk except the last
/// holds exactly `max_words` words. Blank input yields an empty vector,
/// not an error.
///
/// # Examples
///
/// ```
/// use gist::segment::chunk_by_words;
///
/// let chunks = chunk_by_words("a b c d e", 2);
/// let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
/// assert_eq!(texts, vec!["a b", "c d", "e"]);
/// ```
#[must_use]
pub fn chunk_by_words(text: &str, max_words: usize) -> Vec<Chunk> {
    let max_words = max_words.max(1);
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }
    words
        .chunks(max_words)
        .enumerate()
        .map(|(index, window)| {
            let start = index * max_words;
            Chunk {
                index,
                word_range: (start, start + window.len()),
                text: window.join(" "),
            }
        })
        .collect()
}

/// Split text into paragraphs on blank-line boundaries.
///
/// Line endings are normalized first, then the text is split on runs of
/// two or more newlines. Text with no blank-line boundary comes back as a
/// single trimmed paragraph.
#[must_use]
pub fn split_paragraphs(text: &str) -> Vec<String> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    // Accumulate lines, flush on blank lines. Runs of 3+ newlines produce
    // empty fragments that the blank-line check drops.
    let mut out = Vec::new();
    let mut current = String::new();
    for line in normalized.lines() {
        if line.trim().is_empty() {
            if !current.trim().is_empty() {
                out.push(current.trim().to_string());
            }
            current.clear();
        } else {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line);
        }
    }
    if !current.trim().is_empty() {
        out.push(current.trim().to_string());
    }
    if out.is_empty() {
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            out.push(trimmed.to_string());
        }
    }
    out
}

/// Split a paragraph into sentences.
///
/// Splits after `.`, `!`, or `?` when followed by whitespace. A paragraph
/// with no terminal punctuation is returned as one sentence.
#[must_use]
pub fn split_sentences(paragraph: &str) -> Vec<String> {
    let trimmed = paragraph.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = trimmed.chars().peekable();
    while let Some(ch) = chars.next() {
        current.push(ch);
        if matches!(ch, '.' | '!' | '?') {
            if chars.peek().map_or(true, |next| next.is_whitespace()) {
                let s = current.trim().to_string();
                if !s.is_empty() {
                    sentences.push(s);
                }
                current.clear();
                // Consume the whitespace run between sentences.
                while chars.peek().is_some_and(|c| c.is_whitespace()) {
                    chars.next();
                }
            }
        }
    }
    let tail = current.trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }
    if sentences.is_empty() {
        sentences.push(trimmed.to_string());
    }
    sentences
}

/// Tokenize text into lower-cased word tokens.
///
/// This is the crate-wide definition of "word": maximal runs of word
/// characters (plus apostrophes), lower-cased. Used by the metrics engine
/// and by the paraphrase degeneracy checks.
///
/// # Examples
///
/// ```
/// use gist::segment::tokenize_words;
///
/// assert_eq!(tokenize_words("The cat sat."), vec!["the", "cat", "sat"]);
/// ```
#[must_use]
pub fn tokenize_words(text: &str) -> Vec<String> {
    WORD_RE
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Count whitespace-delimited words. Cheaper than tokenizing when only a
/// count is needed (length scaling, truncation checks).
#[must_use]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
