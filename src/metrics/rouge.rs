//! ROUGE-1/2/L precision, recall, and F1.
//!
//! ROUGE-1/2 use clipped n-gram overlap counts; ROUGE-L uses the longest
//! common subsequence. All numbers are rounded to four decimal places at
//! this boundary only, so no rounding error compounds inside other
//! computations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::metrics::MetricValue;
use crate::segment::tokenize_words;

/// Precision/recall/F1 triple for one ROUGE variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RougeScore {
    /// Overlap / candidate size.
    pub precision: f64,
    /// Overlap / reference size.
    pub recall: f64,
    /// Harmonic mean of precision and recall.
    pub f1: f64,
}

/// ROUGE score bundle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RougeScores {
    /// Unigram overlap.
    pub rouge1: RougeScore,
    /// Bigram overlap.
    pub rouge2: RougeScore,
    /// Longest-common-subsequence overlap.
    #[serde(rename = "rougeL")]
    pub rouge_l: RougeScore,
}

/// Compute ROUGE-1, ROUGE-2, and ROUGE-L of `candidate` against
/// `reference`.
///
/// With `use_stemmer` set, tokens are passed through a light
/// suffix-stripping stemmer before matching, so inflection differences
/// ("runs" vs "running") still count as overlap.
#[must_use]
pub fn rouge(reference: &str, candidate: &str, use_stemmer: bool) -> MetricValue<RougeScores> {
    let mut ref_tokens = tokenize_words(reference);
    let mut cand_tokens = tokenize_words(candidate);
    if ref_tokens.is_empty() {
        return MetricValue::unavailable("reference tokenizes to zero words");
    }
    if cand_tokens.is_empty() {
        return MetricValue::unavailable("candidate tokenizes to zero words");
    }
    if use_stemmer {
        for token in ref_tokens.iter_mut().chain(cand_tokens.iter_mut()) {
            *token = stem(token);
        }
    }

    MetricValue::Ready(RougeScores {
        rouge1: rouge_n(&ref_tokens, &cand_tokens, 1),
        rouge2: rouge_n(&ref_tokens, &cand_tokens, 2),
        rouge_l: rouge_l(&ref_tokens, &cand_tokens),
    })
}

fn rouge_n(reference: &[String], candidate: &[String], n: usize) -> RougeScore {
    let ref_total = reference.len().saturating_sub(n - 1);
    let cand_total = candidate.len().saturating_sub(n - 1);
    if ref_total == 0 || cand_total == 0 {
        return score_from(0.0, 0, 0);
    }

    let mut ref_counts: HashMap<&[String], usize> = HashMap::new();
    for gram in reference.windows(n) {
        *ref_counts.entry(gram).or_insert(0) += 1;
    }
    let mut matched = 0usize;
    for gram in candidate.windows(n) {
        if let Some(count) = ref_counts.get_mut(gram) {
            if *count > 0 {
                *count -= 1;
                matched += 1;
            }
        }
    }
    score_from(matched as f64, cand_total, ref_total)
}

fn rouge_l(reference: &[String], candidate: &[String]) -> RougeScore {
    let lcs = lcs_length(reference, candidate) as f64;
    score_from(lcs, candidate.len(), reference.len())
}

fn score_from(matched: f64, cand_total: usize, ref_total: usize) -> RougeScore {
    let precision = if cand_total == 0 {
        0.0
    } else {
        matched / cand_total as f64
    };
    let recall = if ref_total == 0 {
        0.0
    } else {
        matched / ref_total as f64
    };
    let f1 = if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    };
    RougeScore {
        precision: round4(precision),
        recall: round4(recall),
        f1: round4(f1),
    }
}

fn lcs_length(a: &[String], b: &[String]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    // One-row DP table.
    let mut row = vec![0usize; b.len() + 1];
    for token_a in a {
        let mut prev_diag = 0;
        for (j, token_b) in b.iter().enumerate() {
            let up = row[j + 1];
            row[j + 1] = if token_a == token_b {
                prev_diag + 1
            } else {
                up.max(row[j])
            };
            prev_diag = up;
        }
    }
    row[b.len()]
}

/// Light suffix-stripping stemmer.
///
/// Not a full Porter stemmer; it folds the most common English inflection
/// suffixes, which is all ROUGE matching needs.
fn stem(word: &str) -> String {
    let w = word.strip_suffix("'s").unwrap_or(word);
    if w.len() > 4 {
        if let Some(base) = w.strip_suffix("sses") {
            return format!("{base}ss");
        }
        if let Some(base) = w.strip_suffix("ies") {
            return format!("{base}i");
        }
        if let Some(base) = w.strip_suffix("ing") {
            if base.len() > 2 {
                return undouble(base);
            }
        }
    }
    if w.len() > 3 {
        if let Some(base) = w.strip_suffix("ed") {
            if base.len() > 2 {
                return undouble(base);
            }
        }
        if w.ends_with('s') && !w.ends_with("ss") && !w.ends_with("us") {
            return w[..w.len() - 1].to_string();
        }
    }
    w.to_string()
}

/// Collapse a doubled trailing consonant ("runn" → "run"), except l/s/z,
/// mirroring the usual stemmer rule.
fn undouble(base: &str) -> String {
    let bytes = base.as_bytes();
    let n = bytes.len();
    if n >= 2
        && bytes[n - 1] == bytes[n - 2]
        && bytes[n - 1].is_ascii_alphabetic()
        && !matches!(bytes[n - 1], b'a' | b'e' | b'i' | b'o' | b'u' | b'l' | b's' | b'z')
    {
        base[..n - 1].to_string()
    } else {
        base.to_string()
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
