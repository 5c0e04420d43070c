//! Decode-parameter value objects and length classes.
//!
//! A [`DecodeParams`] value, together with a prompt string, fully
//! determines one generation call. The canonical constructors correspond
//! to the three decode shapes the controllers use: extractive beam search
//! for summaries, nucleus sampling for the first paraphrase candidate,
//! and diverse-beam-group search for the second.

use serde::{Deserialize, Serialize};

/// Words-to-tokens expansion factor used when scaling paraphrase bounds
/// from the input word count.
pub const TOKENS_PER_WORD: f64 = 1.3;

/// Maximum words per summarization chunk.
pub const CHUNK_MAX_WORDS: usize = 800;

/// Generation mode for one decode call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeStrategy {
    /// Deterministic beam search (diverse-beam when `num_beam_groups > 1`).
    Beam,
    /// Temperature/top-p sampling.
    Sample,
}

/// Parameters for one generation call.
///
/// Value object, never mutated after construction; retries build new
/// values rather than editing old ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodeParams {
    /// Decode mode.
    pub strategy: DecodeStrategy,
    /// Beam count (beam strategies only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_beams: Option<u32>,
    /// Diverse beam group count (beam strategies only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_beam_groups: Option<u32>,
    /// Penalty between diverse beam groups.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diversity_penalty: Option<f64>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Nucleus sampling mass.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Top-k sampling cutoff.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    /// Length preference; >1.0 favors longer outputs.
    pub length_penalty: f64,
    /// Penalty for repeated tokens.
    pub repetition_penalty: f64,
    /// Forbid repeating n-grams of this size (0 = disabled).
    pub no_repeat_ngram_size: u32,
    /// Minimum tokens to generate.
    pub min_new_tokens: u32,
    /// Maximum tokens to generate.
    pub max_new_tokens: u32,
    /// Stop as soon as all beams finish.
    pub early_stopping: bool,
}

impl DecodeParams {
    /// Beam-search parameters for extractive-style compression.
    ///
    /// `num_beams=6`, `length_penalty=2.0`, `early_stopping` — the shape
    /// used for every per-chunk summary call and for the reduce pass.
    #[must_use]
    pub fn summary_beam(min_new_tokens: u32, max_new_tokens: u32) -> Self {
        Self {
            strategy: DecodeStrategy::Beam,
            num_beams: Some(6),
            num_beam_groups: None,
            diversity_penalty: None,
            temperature: None,
            top_p: None,
            top_k: None,
            length_penalty: 2.0,
            repetition_penalty: 1.0,
            no_repeat_ngram_size: 0,
            min_new_tokens,
            max_new_tokens,
            early_stopping: true,
        }
    }

    /// Sampling parameters for the first paraphrase candidate.
    ///
    /// Temperature and top-p scale with caller-supplied creativity.
    #[must_use]
    pub fn paraphrase_sampling(
        creativity: f64,
        min_new_tokens: u32,
        max_new_tokens: u32,
    ) -> Self {
        let creativity = creativity.clamp(0.0, 1.0);
        Self {
            strategy: DecodeStrategy::Sample,
            num_beams: None,
            num_beam_groups: None,
            diversity_penalty: None,
            temperature: Some(0.5 + creativity),
            top_p: Some((0.85 + creativity / 10.0).min(0.99)),
            top_k: None,
            length_penalty: 1.0,
            repetition_penalty: 1.2,
            no_repeat_ngram_size: 3,
            min_new_tokens,
            max_new_tokens,
            early_stopping: true,
        }
    }

    /// Diverse-beam-group parameters for the second paraphrase candidate.
    ///
    /// Deterministic; diversity comes from the group penalty.
    #[must_use]
    pub fn paraphrase_diverse_beam(min_new_tokens: u32, max_new_tokens: u32) -> Self {
        Self {
            strategy: DecodeStrategy::Beam,
            num_beams: Some(4),
            num_beam_groups: Some(4),
            diversity_penalty: Some(1.0),
            temperature: None,
            top_p: None,
            top_k: None,
            length_penalty: 1.2,
            repetition_penalty: 1.3,
            no_repeat_ngram_size: 2,
            min_new_tokens,
            max_new_tokens,
            early_stopping: true,
        }
    }

    /// Return a copy with updated token bounds.
    #[must_use]
    pub fn with_bounds(mut self, min_new_tokens: u32, max_new_tokens: u32) -> Self {
        self.min_new_tokens = min_new_tokens;
        self.max_new_tokens = max_new_tokens;
        self
    }
}

/// Target output length class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthClass {
    /// Compressed output.
    Short,
    /// Default.
    #[default]
    Medium,
    /// Expanded output.
    Long,
}

impl LengthClass {
    /// Parse a length class from a string; unknown classes default to
    /// `Medium` rather than failing, matching the degrade-gracefully
    /// policy used throughout.
    #[must_use]
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "short" => LengthClass::Short,
            "long" => LengthClass::Long,
            _ => LengthClass::Medium,
        }
    }

    /// Fixed summary token bounds `(min, max)` for this class.
    #[must_use]
    pub fn summary_bounds(self) -> (u32, u32) {
        match self {
            LengthClass::Short => (30, 80),
            LengthClass::Medium => (80, 150),
            LengthClass::Long => (150, 300),
        }
    }

    /// Paraphrase token bounds `(min, max)` scaled from the input word
    /// count.
    ///
    /// A paraphrase should track the original's length, so bounds scale
    /// with the source (unlike the fixed summary table): the word count
    /// is multiplied by a per-class factor and the words-to-tokens
    /// expansion, then clamped to per-class floors and ceilings.
    #[must_use]
    pub fn paraphrase_bounds(self, source_words: usize) -> (u32, u32) {
        let words = source_words.max(1) as f64;
        let (min_mult, max_mult, min_clamp, max_clamp) = match self {
            LengthClass::Short => (0.8, 1.0, (24, 384), (32, 512)),
            LengthClass::Medium => (1.0, 1.2, (32, 512), (48, 640)),
            LengthClass::Long => (1.2, 1.5, (48, 512), (64, 768)),
        };
        let min = clamp_tokens(words * min_mult * TOKENS_PER_WORD, min_clamp);
        let max = clamp_tokens(words * max_mult * TOKENS_PER_WORD, max_clamp);
        (min, max.max(min))
    }
}

fn clamp_tokens(value: f64, (lo, hi): (u32, u32)) -> u32 {
    (value as u32).clamp(lo, hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_bounds_table() {
        assert_eq!(LengthClass::Short.summary_bounds(), (30, 80));
        assert_eq!(LengthClass::Medium.summary_bounds(), (80, 150));
        assert_eq!(LengthClass::Long.summary_bounds(), (150, 300));
    }

    #[test]
    fn unknown_class_defaults_to_medium() {
        assert_eq!(LengthClass::parse_lenient("extra-long"), LengthClass::Medium);
        assert_eq!(LengthClass::parse_lenient("SHORT"), LengthClass::Short);
        assert_eq!(LengthClass::parse_lenient(""), LengthClass::Medium);
    }

    #[test]
    fn paraphrase_bounds_scale_with_words() {
        let (min_a, max_a) = LengthClass::Medium.paraphrase_bounds(100);
        // 100 words * 1.0 * 1.3 = 130, * 1.2 * 1.3 = 156
        assert_eq!((min_a, max_a), (130, 156));
        let (min_b, max_b) = LengthClass::Medium.paraphrase_bounds(10);
        // Small inputs hit the floors.
        assert_eq!((min_b, max_b), (32, 48));
    }

    #[test]
    fn paraphrase_bounds_hit_ceilings() {
        let (min, max) = LengthClass::Long.paraphrase_bounds(10_000);
        assert_eq!((min, max), (512, 768));
        assert!(min <= max);
    }

    #[test]
    fn summary_beam_shape() {
        let p = DecodeParams::summary_beam(80, 150);
        assert_eq!(p.strategy, DecodeStrategy::Beam);
        assert_eq!(p.num_beams, Some(6));
        assert!((p.length_penalty - 2.0).abs() < f64::EPSILON);
        assert!(p.early_stopping);
        assert_eq!((p.min_new_tokens, p.max_new_tokens), (80, 150));
    }

    #[test]
    fn sampling_tracks_creativity() {
        let p = DecodeParams::paraphrase_sampling(0.3, 32, 64);
        assert_eq!(p.strategy, DecodeStrategy::Sample);
        assert!((p.temperature.unwrap() - 0.8).abs() < 1e-9);
        assert!((p.top_p.unwrap() - 0.88).abs() < 1e-9);

        // Creativity is clamped and top_p capped at 0.99.
        let hot = DecodeParams::paraphrase_sampling(5.0, 32, 64);
        assert!((hot.temperature.unwrap() - 1.5).abs() < 1e-9);
        assert!((hot.top_p.unwrap() - 0.95).abs() < 1e-9);
    }

    #[test]
    fn diverse_beam_shape() {
        let p = DecodeParams::paraphrase_diverse_beam(32, 64);
        assert_eq!(p.num_beams, Some(4));
        assert_eq!(p.num_beam_groups, Some(4));
        assert!((p.diversity_penalty.unwrap() - 1.0).abs() < f64::EPSILON);
        assert!(p.temperature.is_none());
    }
}
