//! Closed-form readability indices and deltas.
//!
//! All formulas are the standard ones over word, sentence, syllable, and
//! character counts. The syllable counter is the usual vowel-group
//! heuristic and the Dale–Chall "difficult word" test approximates the
//! published 3,000-word easy list with a compact common-word list plus a
//! syllable test; both approximations cancel out in deltas, which is how
//! these numbers are consumed.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::metrics::MetricValue;
use crate::segment::{split_paragraphs, split_sentences, tokenize_words};

/// Common English words treated as "easy" for Dale–Chall.
///
/// A compact stand-in for the published easy-word list; words not on it
/// must also fail the syllable test to count as difficult.
static EASY_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    const WORDS: &str = "a about after again all almost also always an and any are around as at \
        away back be because been before best better between big both but by came can come could \
        day did different do does down each early end even every far few find first for found \
        from get give go good got great had has have he her here him his home house how i if in \
        into is it its just keep kind know large last left life like little long look made make \
        man many may me men might more most much must my name never new next no not now of off \
        old on once one only open or other our out over own part people place put right run said \
        same saw say school see she should show small so some something still such take tell than \
        that the their them then there these they thing think this those three through time to \
        together too two under until up us use used very want was water way we well went were \
        what when where which while white who why will with word work world would write year you \
        your";
    WORDS.split_whitespace().collect()
});

/// Reading-difficulty band derived from Flesch Reading Ease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComplexityBand {
    /// Flesch ≥ 80: easy text.
    Beginner,
    /// Flesch in [50, 80).
    Intermediate,
    /// Flesch < 50: dense text.
    Advanced,
}

/// Readability index bundle for one text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReadabilityScores {
    /// Flesch Reading Ease; higher is easier.
    pub flesch_reading_ease: f64,
    /// Flesch–Kincaid grade level.
    pub flesch_kincaid_grade: f64,
    /// Gunning Fog index.
    pub gunning_fog: f64,
    /// SMOG index.
    pub smog_index: f64,
    /// Automated Readability Index.
    pub automated_readability_index: f64,
    /// Coleman–Liau index.
    pub coleman_liau_index: f64,
    /// Dale–Chall readability score.
    pub dale_chall_readability_score: f64,
    /// Whitespace-delimited word count.
    pub word_count: usize,
    /// Difficulty band from the Flesch score.
    pub complexity_band: ComplexityBand,
}

/// Signed elementwise difference between two readability bundles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReadabilityDelta {
    /// Delta of Flesch Reading Ease.
    pub flesch_reading_ease: f64,
    /// Delta of Flesch–Kincaid grade.
    pub flesch_kincaid_grade: f64,
    /// Delta of Gunning Fog.
    pub gunning_fog: f64,
    /// Delta of SMOG.
    pub smog_index: f64,
    /// Delta of ARI.
    pub automated_readability_index: f64,
    /// Delta of Coleman–Liau.
    pub coleman_liau_index: f64,
    /// Delta of Dale–Chall.
    pub dale_chall_readability_score: f64,
    /// Delta of word count.
    pub word_count: i64,
}

/// Compute the readability bundle for `text`.
///
/// Empty or wordless text yields an unavailable marker, never a crash.
#[must_use]
pub fn readability(text: &str) -> MetricValue<ReadabilityScores> {
    let words = tokenize_words(text);
    if words.is_empty() {
        return MetricValue::unavailable("text has no words");
    }
    let sentence_count = split_paragraphs(text)
        .iter()
        .map(|p| split_sentences(p).len())
        .sum::<usize>()
        .max(1);

    let word_count = words.len();
    let w = word_count as f64;
    let s = sentence_count as f64;

    let mut syllables = 0usize;
    let mut polysyllables = 0usize;
    let mut difficult = 0usize;
    let mut chars = 0usize;
    for word in &words {
        let syl = count_syllables(word);
        syllables += syl;
        if syl >= 3 {
            polysyllables += 1;
            if !EASY_WORDS.contains(word.as_str()) {
                difficult += 1;
            }
        }
        chars += word.chars().filter(|c| c.is_alphanumeric()).count();
    }
    let syl = syllables as f64;
    let chars = chars as f64;

    let flesch_reading_ease = 206.835 - 1.015 * (w / s) - 84.6 * (syl / w);
    let flesch_kincaid_grade = 0.39 * (w / s) + 11.8 * (syl / w) - 15.59;
    let gunning_fog = 0.4 * ((w / s) + 100.0 * (polysyllables as f64 / w));
    let smog_index = 1.0430 * (polysyllables as f64 * (30.0 / s)).sqrt() + 3.1291;
    let automated_readability_index = 4.71 * (chars / w) + 0.5 * (w / s) - 21.43;
    let coleman_liau_index = 0.0588 * (chars / w * 100.0) - 0.296 * (s / w * 100.0) - 15.8;
    let difficult_ratio = difficult as f64 / w;
    let mut dale_chall_readability_score = 0.1579 * (difficult_ratio * 100.0) + 0.0496 * (w / s);
    if difficult_ratio > 0.05 {
        dale_chall_readability_score += 3.6365;
    }

    MetricValue::Ready(ReadabilityScores {
        flesch_reading_ease,
        flesch_kincaid_grade,
        gunning_fog,
        smog_index,
        automated_readability_index,
        coleman_liau_index,
        dale_chall_readability_score,
        word_count,
        complexity_band: categorize(flesch_reading_ease),
    })
}

/// Band a Flesch Reading Ease score.
#[must_use]
pub fn categorize(flesch_reading_ease: f64) -> ComplexityBand {
    if flesch_reading_ease >= 80.0 {
        ComplexityBand::Beginner
    } else if flesch_reading_ease >= 50.0 {
        ComplexityBand::Intermediate
    } else {
        ComplexityBand::Advanced
    }
}

/// Elementwise `b - a`.
///
/// Antisymmetric by construction: `readability_delta(a, b)` is the
/// negation of `readability_delta(b, a)` in every field.
#[must_use]
pub fn readability_delta(a: &ReadabilityScores, b: &ReadabilityScores) -> ReadabilityDelta {
    ReadabilityDelta {
        flesch_reading_ease: b.flesch_reading_ease - a.flesch_reading_ease,
        flesch_kincaid_grade: b.flesch_kincaid_grade - a.flesch_kincaid_grade,
        gunning_fog: b.gunning_fog - a.gunning_fog,
        smog_index: b.smog_index - a.smog_index,
        automated_readability_index: b.automated_readability_index
            - a.automated_readability_index,
        coleman_liau_index: b.coleman_liau_index - a.coleman_liau_index,
        dale_chall_readability_score: b.dale_chall_readability_score
            - a.dale_chall_readability_score,
        word_count: b.word_count as i64 - a.word_count as i64,
    }
}

/// Count syllables with the vowel-group heuristic.
fn count_syllables(word: &str) -> usize {
    let lower = word.to_lowercase();
    let mut count = 0usize;
    let mut prev_vowel = false;
    for c in lower.chars() {
        let vowel = matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
        if vowel && !prev_vowel {
            count += 1;
        }
        prev_vowel = vowel;
    }
    // Silent trailing e ("make", "circle" keeps its -le syllable).
    if lower.ends_with('e') && !lower.ends_with("le") && count > 1 {
        count -= 1;
    }
    count.max(1)
}
