//! # gist
//!
//! Summarization and paraphrasing over swappable sequence-to-sequence
//! generators, plus quality evaluation of the generated text.
//!
//! - **Summarize**: chunk-and-reduce document reduction under length
//!   constraints ([`Summarizer`])
//! - **Paraphrase**: two genuinely different candidates with
//!   anti-degeneracy retry ([`Paraphraser`])
//! - **Score**: BLEU, ROUGE-1/2/L, n-gram perplexity, and readability
//!   deltas ([`metrics::score`])
//!
//! The generator itself (model weights, tokenizer, decoding runtime) is
//! an external collaborator behind the [`Generator`] trait; the crate
//! contains the orchestration and evaluation logic around it. A
//! [`MockGenerator`] ships for tests.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use gist::{GenerationGateway, LengthClass, MockGenerator, Summarizer};
//!
//! let mock = Arc::new(MockGenerator::new("t5-base").with_script(vec![
//!     "A concise summary of the document.",
//! ]));
//! let gateway = Arc::new(GenerationGateway::with_generator(mock));
//! let summarizer = Summarizer::new(gateway);
//!
//! let summary = summarizer
//!     .summarize("Some long document text…", LengthClass::Short, "t5-base", None)
//!     .unwrap();
//! assert_eq!(summary.as_text(), Some("A concise summary of the document."));
//! ```
//!
//! ## Scoring
//!
//! ```rust
//! use gist::metrics::score;
//!
//! let report = score("The cat sat on the mat.", "A cat sat on a mat.", None);
//! assert!(report.rouge.is_ready());
//! ```
//!
//! ## Design Philosophy
//!
//! - **Retry policy lives in controllers**: the gateway never retries;
//!   only detectable, correctable degeneracy is retried, infrastructure
//!   failures propagate immediately.
//! - **Metrics never throw for data**: empty or degenerate text yields an
//!   in-band unavailable marker so partial reports still render.
//! - **One definition of "word"**: the metrics engine and the degeneracy
//!   checks share the same tokenizer.
//! - **Load once**: generator handles are cached per model id for the
//!   process lifetime, with single-flight first loads.

#![warn(missing_docs)]

pub mod diversity;
mod error;
pub mod gateway;
pub mod metrics;
pub mod model;
pub mod params;
pub mod reduce;
pub mod segment;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Instant;

pub use diversity::{DegeneracyVerdict, ParaphraseCandidate, ParaphraseOutcome, Paraphraser};
pub use error::{Error, Result};
pub use gateway::{Candidate, GenerationGateway, Generator, HistoryHook, TransformRecord};
pub use metrics::{score, MetricValue, ScoreReport};
pub use model::{resolve_alias, ModelFamily, PromptKind};
pub use params::{DecodeParams, DecodeStrategy, LengthClass};
pub use reduce::{Summarizer, Summary};
pub use segment::Chunk;

pub mod prelude {
    //! Commonly used items, re-exported for convenience.
    pub use crate::diversity::{ParaphraseOutcome, Paraphraser};
    pub use crate::error::{Error, Result};
    pub use crate::gateway::{Candidate, GenerationGateway, Generator};
    pub use crate::metrics::{score, MetricValue, ScoreReport};
    pub use crate::params::{DecodeParams, LengthClass};
    pub use crate::reduce::{Summarizer, Summary};
    pub use crate::MockGenerator;
}

/// Summarize `text` with a one-off controller. Convenience wrapper over
/// [`Summarizer`].
///
/// # Errors
///
/// See [`Summarizer::summarize`].
pub fn summarize(
    gateway: &Arc<GenerationGateway>,
    text: &str,
    length: LengthClass,
    model_id: &str,
) -> Result<Summary> {
    Summarizer::new(Arc::clone(gateway)).summarize(text, length, model_id, None)
}

/// Paraphrase `text` with a one-off controller. Convenience wrapper over
/// [`Paraphraser`].
///
/// # Errors
///
/// See [`Paraphraser::paraphrase`].
pub fn paraphrase(
    gateway: &Arc<GenerationGateway>,
    text: &str,
    length: LengthClass,
    creativity: f64,
    model_id: &str,
) -> Result<ParaphraseOutcome> {
    Paraphraser::new(Arc::clone(gateway)).paraphrase(text, length, creativity, model_id, None)
}

/// One recorded generation call made against a [`MockGenerator`].
#[derive(Debug, Clone)]
pub struct GenerationCall {
    /// The prompt as the controller rendered it.
    pub prompt: String,
    /// The decode parameters of the call.
    pub params: DecodeParams,
}

/// A scripted generator for tests.
///
/// Returns scripted outputs in order and records every call it receives.
/// An exhausted script fails the call with
/// [`Error::GenerationUnavailable`], so a test that issues more calls
/// than it scripted fails loudly instead of silently looping.
///
/// # Example
///
/// ```rust
/// use gist::{Generator, MockGenerator, DecodeParams};
///
/// let mock = MockGenerator::new("test-model").with_script(vec!["output one"]);
/// let params = DecodeParams::summary_beam(30, 80);
/// assert_eq!(mock.generate("prompt", &params).unwrap(), "output one");
/// assert_eq!(mock.call_count(), 1);
/// ```
pub struct MockGenerator {
    model_id: String,
    script: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<GenerationCall>>,
    failure: Option<String>,
}

impl MockGenerator {
    /// Create a mock with an empty script.
    #[must_use]
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            failure: None,
        }
    }

    /// Create a mock whose every call fails with
    /// [`Error::GenerationUnavailable`].
    #[must_use]
    pub fn failing(model_id: impl Into<String>, message: impl Into<String>) -> Self {
        let mut mock = Self::new(model_id);
        mock.failure = Some(message.into());
        mock
    }

    /// Append outputs to the script, returned in order.
    #[must_use]
    pub fn with_script(self, outputs: Vec<&str>) -> Self {
        {
            let mut script = lock(&self.script);
            script.extend(outputs.into_iter().map(String::from));
        }
        self
    }

    /// All calls recorded so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<GenerationCall> {
        lock(&self.calls).clone()
    }

    /// Number of calls recorded so far (including failed ones).
    #[must_use]
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }
}

impl Generator for MockGenerator {
    fn generate(&self, prompt: &str, params: &DecodeParams) -> Result<String> {
        lock(&self.calls).push(GenerationCall {
            prompt: prompt.to_string(),
            params: params.clone(),
        });
        if let Some(message) = &self.failure {
            return Err(Error::unavailable(message.clone()));
        }
        lock(&self.script)
            .pop_front()
            .ok_or_else(|| Error::unavailable("mock script exhausted"))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// A deadline `duration` from now, for gateway calls.
#[must_use]
pub fn deadline_in(duration: std::time::Duration) -> Instant {
    Instant::now() + duration
}
