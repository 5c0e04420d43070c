//! Text-quality metrics and the evaluation facade.
//!
//! Every metric is a pure function over token sequences, total over its
//! documented input domain: data-quality problems (empty text, too few
//! tokens) produce a [`MetricValue::Unavailable`] marker instead of an
//! error, so a score report always renders whatever was computable.
//!
//! [`score`] is the single entry point that bundles BLEU, ROUGE,
//! perplexity, and readability deltas into one [`ScoreReport`].

pub mod bleu;
pub mod perplexity;
pub mod readability;
pub mod rouge;

use serde::{Deserialize, Serialize};

pub use bleu::{bleu, BleuScores};
pub use perplexity::{perplexity, Perplexity, DEFAULT_NGRAM};
pub use readability::{
    categorize, readability, readability_delta, ComplexityBand, ReadabilityDelta,
    ReadabilityScores,
};
pub use rouge::{rouge, RougeScore, RougeScores};

/// A metric result that may be soft-unavailable.
///
/// "Unavailable" is a data condition (empty text, too few tokens), not a
/// bug: callers render the reason instead of the number. This replaces
/// the original system's habit of swallowing exceptions into empty dicts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum MetricValue<T> {
    /// The metric was computed.
    Ready(T),
    /// The metric could not be computed from this input.
    Unavailable {
        /// Human-readable explanation.
        reason: String,
    },
}

impl<T> MetricValue<T> {
    /// Build an unavailable marker.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        MetricValue::Unavailable {
            reason: reason.into(),
        }
    }

    /// Whether a value is present.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, MetricValue::Ready(_))
    }

    /// The value, if present.
    #[must_use]
    pub fn ready(&self) -> Option<&T> {
        match self {
            MetricValue::Ready(value) => Some(value),
            MetricValue::Unavailable { .. } => None,
        }
    }

    /// Map over the ready value, preserving unavailability.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> MetricValue<U> {
        match self {
            MetricValue::Ready(value) => MetricValue::Ready(f(value)),
            MetricValue::Unavailable { reason } => MetricValue::Unavailable { reason },
        }
    }
}

/// Two readability bundles and their signed delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadabilityComparison {
    /// The baseline text's scores (original or reference).
    pub baseline: ReadabilityScores,
    /// The candidate text's scores.
    pub candidate: ReadabilityScores,
    /// `candidate - baseline`, elementwise.
    pub delta: ReadabilityDelta,
}

/// The full evaluation bundle for one (reference, candidate) pair.
///
/// Field names follow the shape consumed by dashboards: per-metric
/// unavailability is embedded, the report itself never fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    /// BLEU of the candidate against the reference.
    pub bleu: MetricValue<BleuScores>,
    /// ROUGE-1/2/L of the candidate against the reference.
    pub rouge: MetricValue<RougeScores>,
    /// Perplexity of the candidate.
    pub perplexity_candidate: MetricValue<Perplexity>,
    /// Perplexity of the reference, for side-by-side fluency comparison.
    pub perplexity_reference: MetricValue<Perplexity>,
    /// Readability of the original source vs the candidate, when the
    /// original was supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readability_original: Option<MetricValue<ReadabilityComparison>>,
    /// Readability of the reference vs the candidate; always attempted.
    pub readability_reference: MetricValue<ReadabilityComparison>,
}

impl ScoreReport {
    /// Whether every attempted metric produced a value.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.bleu.is_ready()
            && self.rouge.is_ready()
            && self.perplexity_candidate.is_ready()
            && self.perplexity_reference.is_ready()
            && self.readability_reference.is_ready()
            && self
                .readability_original
                .as_ref()
                .map_or(true, MetricValue::is_ready)
    }
}

/// Score `candidate` against `reference` (and optionally against the
/// `original` source text).
///
/// Never fails: degenerate inputs degrade to per-metric unavailability.
///
/// # Examples
///
/// ```
/// use gist::metrics::score;
///
/// let report = score(
///     "The cat sat on the mat.",
///     "A cat sat on a mat.",
///     None,
/// );
/// assert!(report.bleu.is_ready());
/// assert!(report.rouge.is_ready());
/// ```
#[must_use]
pub fn score(reference: &str, candidate: &str, original: Option<&str>) -> ScoreReport {
    ScoreReport {
        bleu: bleu(reference, candidate),
        rouge: rouge(reference, candidate, true),
        perplexity_candidate: perplexity(candidate, DEFAULT_NGRAM),
        perplexity_reference: perplexity(reference, DEFAULT_NGRAM),
        readability_original: original.map(|o| compare_readability(o, candidate)),
        readability_reference: compare_readability(reference, candidate),
    }
}

/// Readability of `baseline` and `candidate` plus their delta; soft-fails
/// if either side has no words.
#[must_use]
pub fn compare_readability(baseline: &str, candidate: &str) -> MetricValue<ReadabilityComparison> {
    let base = match readability(baseline) {
        MetricValue::Ready(v) => v,
        MetricValue::Unavailable { reason } => {
            return MetricValue::unavailable(format!("baseline: {reason}"))
        }
    };
    let cand = match readability(candidate) {
        MetricValue::Ready(v) => v,
        MetricValue::Unavailable { reason } => {
            return MetricValue::unavailable(format!("candidate: {reason}"))
        }
    };
    MetricValue::Ready(ReadabilityComparison {
        delta: readability_delta(&base, &cand),
        baseline: base,
        candidate: cand,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_report_on_healthy_inputs() {
        let report = score(
            "The cat sat on the mat.",
            "A cat sat on a mat.",
            Some("Long ago, in a small house, the family cat sat down on the woven mat."),
        );
        assert!(report.is_complete());

        let bleu = report.bleu.ready().unwrap();
        assert!(bleu.bleu_1 > 0.5);
        let rouge = report.rouge.ready().unwrap();
        assert!(rouge.rouge1.f1 > 0.5);
        let ppl = report.perplexity_candidate.ready().unwrap();
        assert!(ppl.perplexity > 0.0);
        assert!(report.readability_original.is_some());
    }

    #[test]
    fn empty_candidate_degrades_not_fails() {
        let report = score("The cat sat on the mat.", "", None);
        assert!(!report.is_complete());
        assert!(!report.bleu.is_ready());
        assert!(!report.rouge.is_ready());
        assert!(!report.perplexity_candidate.is_ready());
        // The reference side still computes.
        assert!(report.perplexity_reference.is_ready());
        assert!(report.readability_original.is_none());
    }

    #[test]
    fn unavailable_reason_is_preserved() {
        let value: MetricValue<BleuScores> = MetricValue::unavailable("too short");
        match value {
            MetricValue::Unavailable { reason } => assert_eq!(reason, "too short"),
            MetricValue::Ready(_) => panic!("expected unavailable"),
        }
    }

    #[test]
    fn metric_value_serializes_tagged() {
        let ready: MetricValue<u32> = MetricValue::Ready(7);
        let json = serde_json::to_value(&ready).unwrap();
        assert_eq!(json["status"], "ready");
        assert_eq!(json["value"], 7);

        let gone: MetricValue<u32> = MetricValue::unavailable("no tokens");
        let json = serde_json::to_value(&gone).unwrap();
        assert_eq!(json["status"], "unavailable");
        assert_eq!(json["value"]["reason"], "no tokens");
    }

    #[test]
    fn comparison_carries_delta() {
        let cmp = compare_readability(
            "The cat sat. It was warm and soft there.",
            "Methodological heterogeneity complicates longitudinal interpretation considerably.",
        )
        .ready()
        .cloned()
        .unwrap();
        assert!(cmp.delta.flesch_reading_ease < 0.0);
    }
}
