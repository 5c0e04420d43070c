//! BLEU: modified n-gram precision with brevity penalty.
//!
//! Reports individual 1–4 gram scores plus the cumulative
//! geometric-mean-weighted score. Scores are in `[0, 1]`; a text that
//! tokenizes to zero words makes the metric unavailable rather than
//! failing.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::metrics::MetricValue;
use crate::segment::tokenize_words;

/// BLEU score bundle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BleuScores {
    /// Unigram precision (with brevity penalty).
    pub bleu_1: f64,
    /// Bigram precision (with brevity penalty).
    pub bleu_2: f64,
    /// Trigram precision (with brevity penalty).
    pub bleu_3: f64,
    /// 4-gram precision (with brevity penalty).
    pub bleu_4: f64,
    /// Cumulative score: brevity penalty times the geometric mean of the
    /// four modified precisions.
    pub bleu: f64,
}

/// Compute BLEU of `candidate` against `reference`.
///
/// # Examples
///
/// ```
/// use gist::metrics::bleu::bleu;
///
/// let scores = bleu("the cat sat", "the cat sat").ready().copied().unwrap();
/// assert!((scores.bleu - 1.0).abs() < 1e-9);
/// assert!((scores.bleu_1 - 1.0).abs() < 1e-9);
/// ```
#[must_use]
pub fn bleu(reference: &str, candidate: &str) -> MetricValue<BleuScores> {
    let ref_tokens = tokenize_words(reference);
    let cand_tokens = tokenize_words(candidate);
    if ref_tokens.is_empty() {
        return MetricValue::unavailable("reference tokenizes to zero words");
    }
    if cand_tokens.is_empty() {
        return MetricValue::unavailable("candidate tokenizes to zero words");
    }

    let precisions: Vec<f64> = (1..=4)
        .map(|n| modified_precision(&ref_tokens, &cand_tokens, n))
        .collect();
    let bp = brevity_penalty(ref_tokens.len(), cand_tokens.len());

    // Geometric mean with uniform weights; any zero precision zeroes the
    // cumulative score.
    let cumulative = if precisions.iter().any(|&p| p == 0.0) {
        0.0
    } else {
        let log_sum: f64 = precisions.iter().map(|p| p.ln()).sum();
        bp * (log_sum / 4.0).exp()
    };

    MetricValue::Ready(BleuScores {
        bleu_1: bp * precisions[0],
        bleu_2: bp * precisions[1],
        bleu_3: bp * precisions[2],
        bleu_4: bp * precisions[3],
        bleu: cumulative,
    })
}

/// Clipped n-gram precision of the candidate against the reference.
///
/// When neither side has any n-gram of this order (texts shorter than
/// `n`), the precision is vacuously 1.0 so that self-BLEU stays perfect
/// for short texts.
fn modified_precision(reference: &[String], candidate: &[String], n: usize) -> f64 {
    let cand_counts = ngram_counts(candidate, n);
    let total: usize = cand_counts.values().sum();
    if total == 0 {
        return if reference.len() < n { 1.0 } else { 0.0 };
    }
    let ref_counts = ngram_counts(reference, n);
    let clipped: usize = cand_counts
        .iter()
        .map(|(gram, &count)| count.min(*ref_counts.get(gram).unwrap_or(&0)))
        .sum();
    clipped as f64 / total as f64
}

fn ngram_counts(tokens: &[String], n: usize) -> HashMap<&[String], usize> {
    let mut counts = HashMap::new();
    if tokens.len() >= n {
        for gram in tokens.windows(n) {
            *counts.entry(gram).or_insert(0) += 1;
        }
    }
    counts
}

fn brevity_penalty(ref_len: usize, cand_len: usize) -> f64 {
    if cand_len >= ref_len {
        1.0
    } else {
        (1.0 - ref_len as f64 / cand_len as f64).exp()
    }
}
