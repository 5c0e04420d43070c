//! Two-candidate paraphrase generation with anti-degeneracy retry.
//!
//! A single decode call reliably produces near-copies of the source for
//! some model families. This controller always produces exactly two
//! candidates with deliberately different decode strategies (sampling vs
//! diverse beam search), checks the pair for degeneracy — near-copy of
//! the source, truncation, near-identical siblings — and retries once
//! with escalated prompts and more permissive bounds if the pair is
//! degenerate. A final, stricter sibling check may regenerate the second
//! candidate alone; the first candidate is never touched after the retry
//! ladder settles.
//!
//! The retry ladder is data (an ordered list of attempts), not nested
//! control flow. Infrastructure errors are never retried here; only
//! degeneracy is.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::gateway::{Candidate, GenerationGateway, HistoryHook, TransformRecord};
use crate::metrics::{readability, MetricValue, ReadabilityScores};
use crate::model::{render_prompt, resolve_alias, ModelFamily, PromptKind};
use crate::params::{DecodeParams, LengthClass};
use crate::segment::{tokenize_words, word_count};

/// Word-count ratio and Jaccard overlap above which a candidate counts
/// as a copy of its source.
pub const SOURCE_COPY_THRESHOLD: f64 = 0.95;

/// Sibling overlap threshold for the first-pass degeneracy check
/// (intersection over the first candidate's word set).
pub const SIBLING_OVERLAP_THRESHOLD: f64 = 0.8;

/// Stricter sibling overlap threshold for the final check (intersection
/// over the smaller word set).
pub const SIBLING_OVERLAP_FINAL_THRESHOLD: f64 = 0.75;

/// Candidates shorter than this fraction of the source word count are
/// considered truncated.
pub const TRUNCATION_RATIO: f64 = 0.7;

/// Why a candidate pair was judged degenerate. Recomputed whenever the
/// pair changes; never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegeneracyVerdict {
    /// A candidate is a near-copy of the source.
    pub too_similar_to_source: bool,
    /// Both candidates are implausibly truncated.
    pub too_short: bool,
    /// The two candidates are near-identical to each other.
    pub too_similar_to_sibling: bool,
}

impl DegeneracyVerdict {
    /// Whether any degeneracy was detected.
    #[must_use]
    pub fn any(self) -> bool {
        self.too_similar_to_source || self.too_short || self.too_similar_to_sibling
    }

    /// Judge a candidate pair against its source.
    #[must_use]
    pub fn assess(source: &str, first: &str, second: &str) -> Self {
        let source_words = word_count(source);
        let too_short =
            is_truncated(first, source_words) && is_truncated(second, source_words);
        DegeneracyVerdict {
            too_similar_to_source: is_near_copy(source, first) || is_near_copy(source, second),
            too_short,
            too_similar_to_sibling: sibling_overlap_first(first, second)
                > SIBLING_OVERLAP_THRESHOLD,
        }
    }
}

// The floor stays fractional: a 7-word candidate of an 11-word source is
// below 7.7 and counts as truncated.
fn is_truncated(text: &str, source_words: usize) -> bool {
    (word_count(text) as f64) < source_words as f64 * TRUNCATION_RATIO
}

/// Near-copy test: exact case-insensitive match, or a candidate whose
/// length and vocabulary both track the source almost perfectly.
#[must_use]
pub fn is_near_copy(source: &str, candidate: &str) -> bool {
    let s = source.trim().to_lowercase();
    let c = candidate.trim().to_lowercase();
    if s.is_empty() || c.is_empty() {
        return false;
    }
    if s == c {
        return true;
    }
    let source_words = word_count(&s).max(1);
    let cand_words = word_count(&c);
    let len_ratio = (cand_words as f64 / source_words as f64).min(1.0);
    len_ratio > SOURCE_COPY_THRESHOLD && jaccard(&s, &c) > SOURCE_COPY_THRESHOLD
}

/// Jaccard coefficient over unique word tokens.
#[must_use]
pub fn jaccard(a: &str, b: &str) -> f64 {
    use std::collections::HashSet;
    let set_a: HashSet<String> = tokenize_words(a).into_iter().collect();
    let set_b: HashSet<String> = tokenize_words(b).into_iter().collect();
    let union = set_a.union(&set_b).count();
    if union == 0 {
        return 0.0;
    }
    set_a.intersection(&set_b).count() as f64 / union as f64
}

/// Shared-word ratio with the FIRST candidate's vocabulary as the
/// denominator (first-pass sibling check).
#[must_use]
pub fn sibling_overlap_first(first: &str, second: &str) -> f64 {
    overlap_ratio(first, second, |a, _b| a)
}

/// Shared-word ratio with the SMALLER vocabulary as the denominator
/// (final, stricter sibling check).
#[must_use]
pub fn sibling_overlap_smallest(first: &str, second: &str) -> f64 {
    overlap_ratio(first, second, usize::min)
}

fn overlap_ratio(first: &str, second: &str, denom: impl Fn(usize, usize) -> usize) -> f64 {
    use std::collections::HashSet;
    let set_a: HashSet<String> = tokenize_words(first).into_iter().collect();
    let set_b: HashSet<String> = tokenize_words(second).into_iter().collect();
    let d = denom(set_a.len(), set_b.len());
    if d == 0 {
        return 0.0;
    }
    set_a.intersection(&set_b).count() as f64 / d as f64
}

/// One rung of the retry ladder: a prompt kind plus the decode shapes
/// for both candidates.
#[derive(Debug, Clone)]
struct Attempt {
    kind: PromptKind,
    sampling: DecodeParams,
    diverse: DecodeParams,
}

/// Build the ordered attempt list for one paraphrase call.
fn attempt_ladder(creativity: f64, length: LengthClass, source_words: usize) -> Vec<Attempt> {
    let (min_new, max_new) = length.paraphrase_bounds(source_words);
    let first = Attempt {
        kind: PromptKind::Paraphrase,
        sampling: DecodeParams::paraphrase_sampling(creativity, min_new, max_new),
        diverse: DecodeParams::paraphrase_diverse_beam(min_new, max_new),
    };

    // Escalated retry: more explicit prompt, more permissive bounds,
    // hotter sampling, stronger length preference.
    let retry_min = ((source_words as f64 * 0.8).max(24.0)) as u32;
    let retry_max = ((source_words as f64 * 1.5).max(64.0)) as u32;
    let mut retry_sampling = DecodeParams::paraphrase_sampling(1.0, retry_min, retry_max);
    retry_sampling.temperature = Some(0.9);
    retry_sampling.top_p = Some(0.95);
    retry_sampling.length_penalty = 1.5;
    retry_sampling.no_repeat_ngram_size = 2;
    retry_sampling.repetition_penalty = 1.1;
    let mut retry_diverse = DecodeParams::paraphrase_diverse_beam(retry_min, retry_max);
    retry_diverse.length_penalty = 1.7;
    retry_diverse.no_repeat_ngram_size = 3;
    let second = Attempt {
        kind: PromptKind::ParaphraseRetry,
        sampling: retry_sampling,
        diverse: retry_diverse,
    };

    vec![first, second]
}

/// Decode parameters for the final second-candidate correction: maximal
/// diverse-beam settings.
fn rewrite_params(min_new: u32, max_new: u32) -> DecodeParams {
    let mut params = DecodeParams::paraphrase_diverse_beam(min_new, max_new);
    params.num_beams = Some(5);
    params.num_beam_groups = Some(5);
    params.diversity_penalty = Some(1.5);
    params.no_repeat_ngram_size = 2;
    params.length_penalty = 1.0;
    params
}

/// One returned paraphrase, paired with its readability analysis.
#[derive(Debug, Clone, Serialize)]
pub struct ParaphraseCandidate {
    /// The candidate, verbatim as generated.
    pub candidate: Candidate,
    /// Readability bundle of the candidate text.
    pub complexity: MetricValue<ReadabilityScores>,
}

/// Result of a paraphrase call: exactly two distinct candidates plus the
/// source's readability for caller-side comparison.
#[derive(Debug, Clone, Serialize)]
pub struct ParaphraseOutcome {
    /// Readability bundle of the source text.
    pub source_complexity: MetricValue<ReadabilityScores>,
    /// The two candidates, in generation order.
    pub candidates: [ParaphraseCandidate; 2],
    /// The verdict that triggered the retry, if one did.
    pub retried_for: Option<DegeneracyVerdict>,
    /// Whether the second candidate was regenerated by the final
    /// correction pass.
    pub second_rewritten: bool,
}

/// Paraphrase controller.
pub struct Paraphraser {
    gateway: Arc<GenerationGateway>,
    history: Option<HistoryHook>,
}

impl Paraphraser {
    /// Create a paraphraser over a gateway.
    #[must_use]
    pub fn new(gateway: Arc<GenerationGateway>) -> Self {
        Self {
            gateway,
            history: None,
        }
    }

    /// Attach a fire-and-forget history hook, invoked once per returned
    /// candidate on success.
    #[must_use]
    pub fn with_history_hook(mut self, hook: HistoryHook) -> Self {
        self.history = Some(hook);
        self
    }

    /// Produce two distinct, complete, non-copy paraphrases of `text`.
    ///
    /// `creativity` in `[0, 1]` scales sampling temperature and nucleus
    /// mass; out-of-range values are clamped.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyInput`] for blank input; gateway errors propagate
    /// as-is (degeneracy is retried, infrastructure failures are not).
    pub fn paraphrase(
        &self,
        text: &str,
        length: LengthClass,
        creativity: f64,
        model_id: &str,
        deadline: Option<Instant>,
    ) -> Result<ParaphraseOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::EmptyInput);
        }
        let model_id = resolve_alias(model_id);
        let family = ModelFamily::from_model_id(model_id);
        let source_words = word_count(text);
        let ladder = attempt_ladder(creativity.clamp(0.0, 1.0), length, source_words);

        let mut pair: Option<(Candidate, Candidate)> = None;
        let mut retried_for = None;
        for (rung, attempt) in ladder.iter().enumerate() {
            let prompt = render_prompt(family, attempt.kind, text);
            let first = self
                .gateway
                .generate(model_id, &prompt, &attempt.sampling, deadline)?;
            let second = self
                .gateway
                .generate(model_id, &prompt, &attempt.diverse, deadline)?;
            let verdict = DegeneracyVerdict::assess(text, &first.text, &second.text);
            pair = Some((first, second));
            if !verdict.any() {
                break;
            }
            if rung + 1 < ladder.len() {
                log::warn!(
                    "degenerate paraphrase pair (copy={}, short={}, sibling={}); \
                     escalating to retry prompt",
                    verdict.too_similar_to_source,
                    verdict.too_short,
                    verdict.too_similar_to_sibling
                );
                retried_for = Some(verdict);
            }
        }
        // The ladder is non-empty, so the pair is always set.
        let (first, mut second) =
            pair.ok_or_else(|| Error::invalid_input("empty attempt ladder"))?;

        // Final, stricter sibling check. Only the second candidate is
        // ever regenerated here; the first is settled.
        let mut second_rewritten = false;
        if sibling_overlap_smallest(&first.text, &second.text) > SIBLING_OVERLAP_FINAL_THRESHOLD
        {
            log::warn!("candidates still too similar; rewriting second candidate");
            let (min_new, max_new) = length.paraphrase_bounds(source_words);
            let prompt = render_prompt(family, PromptKind::RewriteDifferently, text);
            second = self.gateway.generate(
                model_id,
                &prompt,
                &rewrite_params(min_new, max_new),
                deadline,
            )?;
            second_rewritten = true;
        }

        if let Some(hook) = &self.history {
            for candidate in [&first, &second] {
                hook(TransformRecord {
                    input: text,
                    output: &candidate.text,
                    model_id,
                    params: &candidate.decode_params,
                });
            }
        }

        Ok(ParaphraseOutcome {
            source_complexity: readability(text),
            candidates: [
                ParaphraseCandidate {
                    complexity: readability(&first.text),
                    candidate: first,
                },
                ParaphraseCandidate {
                    complexity: readability(&second.text),
                    candidate: second,
                },
            ],
            retried_for,
            second_rewritten,
        })
    }
}
