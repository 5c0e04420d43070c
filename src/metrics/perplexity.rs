//! N-gram perplexity estimate.
//!
//! A fluency proxy, not a true language-model perplexity: a small
//! Laplace-smoothed n-gram model is trained on the text's own token
//! stream and the exponentiated average negative log-likelihood of that
//! stream is reported. Repetitive, predictable text scores low; erratic
//! token sequences score high.
//!
//! Texts too short to train on (fewer than [`MIN_TRAIN_TOKENS`]) borrow a
//! fixed built-in reference corpus for the counts, so short candidates
//! still get an estimate. Texts with fewer tokens than the n-gram order
//! are reported unavailable.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::metrics::MetricValue;
use crate::segment::tokenize_words;

/// Default n-gram order used by the evaluation facade.
pub const DEFAULT_NGRAM: usize = 2;

/// Below this many tokens the built-in corpus backs the counts.
pub const MIN_TRAIN_TOKENS: usize = 30;

/// A handful of plain English sentences; enough to ground bigram counts
/// for short inputs without shipping a corpus file.
const REFERENCE_CORPUS: &str = "The quick brown fox jumps over the lazy dog. \
    A summary should capture the main points of the original text in fewer words. \
    The committee met on Tuesday to discuss the annual budget and the new proposal. \
    She walked to the station, bought a ticket, and waited for the morning train. \
    Researchers found that the results were consistent across all of the experiments. \
    The weather was clear and the roads were quiet for most of the afternoon.";

/// Perplexity result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Perplexity {
    /// Exponentiated average negative log-likelihood; always positive.
    pub perplexity: f64,
    /// The n-gram order used.
    pub ngram: usize,
}

/// Estimate the n-gram perplexity of `text`.
#[must_use]
pub fn perplexity(text: &str, n: usize) -> MetricValue<Perplexity> {
    if n == 0 {
        return MetricValue::unavailable("n-gram order must be at least 1");
    }
    let tokens = tokenize_words(text);
    if tokens.len() < n {
        return MetricValue::unavailable(format!(
            "text has {} tokens, fewer than the n-gram order {n}",
            tokens.len()
        ));
    }

    // Train on the text itself; pad short texts with the reference
    // corpus so the counts are not hopelessly sparse.
    let mut train = tokens.clone();
    if tokens.len() < MIN_TRAIN_TOKENS {
        train.extend(tokenize_words(REFERENCE_CORPUS));
    }

    let mut context_counts: HashMap<&[String], usize> = HashMap::new();
    let mut ngram_counts: HashMap<&[String], usize> = HashMap::new();
    let mut vocab: HashSet<&str> = HashSet::new();
    for token in &train {
        vocab.insert(token.as_str());
    }
    for gram in train.windows(n) {
        *ngram_counts.entry(gram).or_insert(0) += 1;
        *context_counts.entry(&gram[..n - 1]).or_insert(0) += 1;
    }
    let vocab_size = vocab.len() as f64;

    let mut neg_log_likelihood = 0.0;
    let mut evaluated = 0usize;
    for gram in tokens.windows(n) {
        let gram_count = *ngram_counts.get(gram).unwrap_or(&0) as f64;
        let context_count = *context_counts.get(&gram[..n - 1]).unwrap_or(&0) as f64;
        // Laplace smoothing keeps every probability strictly positive.
        let prob = (gram_count + 1.0) / (context_count + vocab_size);
        neg_log_likelihood -= prob.ln();
        evaluated += 1;
    }

    let ppl = (neg_log_likelihood / evaluated as f64).exp();
    MetricValue::Ready(Perplexity {
        perplexity: ppl,
        ngram: n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perplexity_is_positive() {
        let p = perplexity("the cat sat on the mat and the dog sat on the rug", 2)
            .ready()
            .copied()
            .unwrap();
        assert!(p.perplexity > 0.0);
        assert_eq!(p.ngram, 2);
    }

    #[test]
    fn repetitive_text_is_more_predictable() {
        let repetitive = "the cat sat the cat sat the cat sat the cat sat \
            the cat sat the cat sat the cat sat the cat sat the cat sat the cat sat";
        let varied = "yesterday morning seven bewildered archaeologists quietly \
            examined unusual ceramic fragments beneath the crumbling monastery \
            walls while distant thunder rolled across darkening autumn hills nearby";
        let p_rep = perplexity(repetitive, 2).ready().copied().unwrap();
        let p_var = perplexity(varied, 2).ready().copied().unwrap();
        assert!(
            p_rep.perplexity < p_var.perplexity,
            "{} !< {}",
            p_rep.perplexity,
            p_var.perplexity
        );
    }

    #[test]
    fn short_text_uses_reference_corpus() {
        // Shorter than MIN_TRAIN_TOKENS but at least n tokens: still
        // available, backed by the built-in corpus.
        let p = perplexity("the cat sat on the mat", 2);
        assert!(p.is_ready());
    }

    #[test]
    fn fewer_tokens_than_order_is_unavailable() {
        assert!(!perplexity("one", 2).is_ready());
        assert!(!perplexity("", 1).is_ready());
        assert!(!perplexity("a b c", 4).is_ready());
    }

    #[test]
    fn zero_order_is_unavailable() {
        assert!(!perplexity("some text", 0).is_ready());
    }
}
