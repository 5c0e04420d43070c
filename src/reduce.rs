//! Chunk-and-reduce summarization.
//!
//! Long input is split into bounded word chunks, each chunk is compressed
//! independently, and the per-chunk summaries are reduced by one more
//! structurally identical generation pass over their concatenation. A
//! single-chunk document skips the reduce pass entirely; its chunk
//! summary is the final result.
//!
//! This controller owns no retry policy: generation failures from the
//! gateway propagate untouched. Degeneracy handling lives in
//! [`crate::diversity`].

use std::sync::Arc;
use std::time::Instant;

use crate::error::{Error, Result};
use crate::gateway::{Candidate, GenerationGateway, HistoryHook, TransformRecord};
use crate::model::{resolve_alias, ModelFamily};
use crate::params::{DecodeParams, LengthClass, CHUNK_MAX_WORDS};
use crate::segment::chunk_by_words;

/// Reduce-pass minimum token floor. Even a short length class gets at
/// least this many tokens in the final pass.
const REDUCE_MIN_TOKENS: u32 = 20;

/// Outcome of a summarize call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Summary {
    /// The final summary text, trimmed.
    Text(String),
    /// Nothing non-blank survived chunking; there was nothing to
    /// summarize. A soft outcome, not an error.
    Empty,
}

impl Summary {
    /// The summary text, if any.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Summary::Text(text) => Some(text),
            Summary::Empty => None,
        }
    }
}

/// Chunk-and-reduce summarization controller.
pub struct Summarizer {
    gateway: Arc<GenerationGateway>,
    history: Option<HistoryHook>,
}

impl Summarizer {
    /// Create a summarizer over a gateway.
    #[must_use]
    pub fn new(gateway: Arc<GenerationGateway>) -> Self {
        Self {
            gateway,
            history: None,
        }
    }

    /// Attach a fire-and-forget history hook, invoked once per successful
    /// summarize call with the final output.
    #[must_use]
    pub fn with_history_hook(mut self, hook: HistoryHook) -> Self {
        self.history = Some(hook);
        self
    }

    /// Summarize `text` to the given length class using `model_id`
    /// (friendly aliases accepted).
    ///
    /// # Errors
    ///
    /// [`Error::EmptyInput`] for blank input; gateway errors
    /// ([`Error::GenerationUnavailable`], [`Error::GenerationTimeout`])
    /// propagate as-is.
    pub fn summarize(
        &self,
        text: &str,
        length: LengthClass,
        model_id: &str,
        deadline: Option<Instant>,
    ) -> Result<Summary> {
        if text.trim().is_empty() {
            return Err(Error::EmptyInput);
        }
        let model_id = resolve_alias(model_id);
        let family = ModelFamily::from_model_id(model_id);
        let (min_len, max_len) = length.summary_bounds();
        let params = family.constrain_summary_params(DecodeParams::summary_beam(min_len, max_len));

        let chunks = chunk_by_words(text, CHUNK_MAX_WORDS);
        let mut chunk_summaries: Vec<Candidate> = Vec::with_capacity(chunks.len());
        for chunk in chunks.iter().filter(|c| !c.text.trim().is_empty()) {
            let generated = self
                .gateway
                .generate(model_id, &chunk.text, &params, deadline)?;
            chunk_summaries.push(Candidate {
                source_chunk_index: Some(chunk.index),
                ..generated
            });
        }

        let (final_text, final_params) = match chunk_summaries.len() {
            0 => {
                log::debug!("no non-blank chunks; nothing to summarize");
                return Ok(Summary::Empty);
            }
            1 => (chunk_summaries[0].text.trim().to_string(), params),
            n => {
                log::info!("reducing {n} chunk summaries into one pass");
                let combined: String = chunk_summaries
                    .iter()
                    .map(|c| c.text.trim())
                    .collect::<Vec<_>>()
                    .join(" ");
                // Structurally the same call as a per-chunk pass; only
                // the minimum bound is floored.
                let reduce_params =
                    params.with_bounds(min_len.max(REDUCE_MIN_TOKENS), max_len);
                let reduced =
                    self.gateway
                        .generate(model_id, &combined, &reduce_params, deadline)?;
                (reduced.text.trim().to_string(), reduced.decode_params)
            }
        };

        if let Some(hook) = &self.history {
            hook(TransformRecord {
                input: text,
                output: &final_text,
                model_id,
                params: &final_params,
            });
        }
        Ok(Summary::Text(final_text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockGenerator;

    fn summarizer(mock: &Arc<MockGenerator>) -> Summarizer {
        let generator: Arc<dyn crate::gateway::Generator> = mock.clone();
        Summarizer::new(Arc::new(GenerationGateway::with_generator(generator)))
    }

    #[test]
    fn blank_input_is_empty_input_error() {
        let mock = Arc::new(MockGenerator::new("m"));
        let s = summarizer(&mock);
        for text in ["", "   ", "\n\t "] {
            let err = s
                .summarize(text, LengthClass::Medium, "modelX", None)
                .unwrap_err();
            assert!(matches!(err, Error::EmptyInput));
        }
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn single_chunk_skips_reduce_pass() {
        let mock = Arc::new(MockGenerator::new("m").with_script(vec!["  a short summary  "]));
        let s = summarizer(&mock);
        let out = s
            .summarize("some short document", LengthClass::Short, "m", None)
            .unwrap();
        assert_eq!(out.as_text(), Some("a short summary"));
        // Exactly one generation call: no reduce pass for one chunk.
        assert_eq!(mock.call_count(), 1);
    }

    #[test]
    fn multi_chunk_runs_one_reduce_pass() {
        let words: Vec<String> = (0..1800).map(|i| format!("w{i}")).collect();
        let text = words.join(" ");
        let mock = Arc::new(MockGenerator::new("m").with_script(vec![
            "first chunk summary",
            "second chunk summary",
            "third chunk summary",
            " the final reduced summary ",
        ]));
        let s = summarizer(&mock);
        let out = s.summarize(&text, LengthClass::Medium, "m", None).unwrap();
        assert_eq!(out.as_text(), Some("the final reduced summary"));
        // 3 chunks of <=800 words + 1 reduce pass.
        assert_eq!(mock.call_count(), 4);

        // The reduce prompt is the space-joined chunk summaries, and its
        // parameters match the per-chunk beam shape with the floored min.
        let calls = mock.calls();
        assert_eq!(
            calls[3].prompt,
            "first chunk summary second chunk summary third chunk summary"
        );
        assert_eq!(calls[3].params.num_beams, Some(6));
        assert_eq!(calls[3].params.min_new_tokens, 80);
        assert_eq!(calls[0].params.min_new_tokens, 80);
    }

    #[test]
    fn short_class_reduce_min_is_floored_at_twenty() {
        // Short class min is 30, above the floor; verify via params on a
        // class whose min would sit below the floor if one existed. The
        // floor only ever raises, never lowers.
        let words: Vec<String> = (0..900).map(|i| format!("w{i}")).collect();
        let text = words.join(" ");
        let mock = Arc::new(
            MockGenerator::new("m").with_script(vec!["a", "b", "reduced"]),
        );
        let s = summarizer(&mock);
        s.summarize(&text, LengthClass::Short, "m", None).unwrap();
        let calls = mock.calls();
        assert_eq!(calls[2].params.min_new_tokens, 30.max(REDUCE_MIN_TOKENS));
    }

    #[test]
    fn bart_models_get_anti_copy_constraints() {
        let mock = Arc::new(MockGenerator::new("m").with_script(vec!["summary"]));
        let s = summarizer(&mock);
        s.summarize("document text", LengthClass::Medium, "bart", None)
            .unwrap();
        let calls = mock.calls();
        assert_eq!(calls[0].params.no_repeat_ngram_size, 3);
    }

    #[test]
    fn generation_errors_propagate_without_retry() {
        let mock = Arc::new(MockGenerator::failing("m", "backend down"));
        let s = summarizer(&mock);
        let err = s
            .summarize("some text", LengthClass::Medium, "m", None)
            .unwrap_err();
        assert!(matches!(err, Error::GenerationUnavailable(_)));
        assert_eq!(mock.call_count(), 1);
    }

    #[test]
    fn history_hook_sees_final_output() {
        use std::sync::Mutex;
        let seen: Arc<Mutex<Vec<(String, String)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mock = Arc::new(MockGenerator::new("m").with_script(vec!["the summary"]));
        let generator: Arc<dyn crate::gateway::Generator> = mock.clone();
        let s = Summarizer::new(Arc::new(GenerationGateway::with_generator(generator)))
            .with_history_hook(Box::new(move |record| {
                sink.lock()
                    .unwrap()
                    .push((record.input.to_string(), record.output.to_string()));
            }));
        s.summarize("input text", LengthClass::Medium, "m", None)
            .unwrap();
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], ("input text".to_string(), "the summary".to_string()));
    }
}
