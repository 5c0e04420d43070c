//! Model families, the friendly-name catalog, and prompt templates.
//!
//! Sequence-to-sequence families need different prompting to paraphrase
//! properly: T5-style models expect a task prefix, instruction-tuned
//! models expect an instruction sentence, and Pegasus-style models take
//! the bare text. The family is resolved once from the model identifier;
//! everything downstream dispatches on the [`ModelFamily`] variant, so
//! supporting a new family means adding a variant and its template rows,
//! not branching controller logic.

use serde::{Deserialize, Serialize};

use crate::params::DecodeParams;

/// Known sequence-to-sequence model families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelFamily {
    /// T5-style models that take a `"task:"` prefix.
    T5,
    /// BART-style models; prone to copying, prompted with instructions.
    Bart,
    /// Instruction-tuned FLAN-T5 models.
    FlanT5,
    /// Everything else (Pegasus etc.); prompted with the bare text.
    Generic,
}

impl ModelFamily {
    /// Resolve the family from a model identifier.
    ///
    /// Resolution happens once, at configuration time. `"flan"` is
    /// checked before `"t5"` because FLAN model ids contain both.
    #[must_use]
    pub fn from_model_id(model_id: &str) -> Self {
        let id = model_id.to_lowercase();
        if id.contains("flan") {
            ModelFamily::FlanT5
        } else if id.contains("t5") {
            ModelFamily::T5
        } else if id.contains("bart") {
            ModelFamily::Bart
        } else {
            ModelFamily::Generic
        }
    }

    /// Whether this family is prone to copying its input verbatim when
    /// summarizing, and needs anti-copy decode constraints.
    #[must_use]
    pub fn copy_prone(self) -> bool {
        matches!(self, ModelFamily::Bart)
    }

    /// Layer family-specific anti-copy constraints onto summary decode
    /// parameters. BART without these tends to echo the source.
    #[must_use]
    pub fn constrain_summary_params(self, mut params: DecodeParams) -> DecodeParams {
        if self.copy_prone() {
            params.no_repeat_ngram_size = 3;
            params.repetition_penalty = 1.1;
        }
        params
    }
}

/// Which prompt a controller is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    /// First paraphrase attempt.
    Paraphrase,
    /// Escalated retry after a degeneracy verdict.
    ParaphraseRetry,
    /// Final correction of the second candidate.
    RewriteDifferently,
}

/// Render the family-specific prompt for `kind` around `text`.
#[must_use]
pub fn render_prompt(family: ModelFamily, kind: PromptKind, text: &str) -> String {
    let template = prompt_template(family, kind);
    match template {
        Some(prefix) => format!("{prefix}{text}"),
        None => text.to_string(),
    }
}

/// The instruction prefix for `(family, kind)`, or `None` for bare text.
fn prompt_template(family: ModelFamily, kind: PromptKind) -> Option<&'static str> {
    match (family, kind) {
        (ModelFamily::T5, PromptKind::Paraphrase) => Some("paraphrase: "),
        (ModelFamily::T5, PromptKind::ParaphraseRetry) => Some("paraphrase this completely: "),
        (ModelFamily::T5, PromptKind::RewriteDifferently) => {
            Some("rewrite completely differently: ")
        }
        (ModelFamily::Bart, PromptKind::Paraphrase) => {
            Some("Paraphrase the following while keeping the original meaning: ")
        }
        (ModelFamily::Bart | ModelFamily::FlanT5, PromptKind::ParaphraseRetry) => {
            Some("Provide a complete paraphrase of this text with similar length: ")
        }
        (ModelFamily::Bart | ModelFamily::FlanT5, PromptKind::RewriteDifferently) => {
            Some("Completely rephrase the following with different words: ")
        }
        (ModelFamily::FlanT5, PromptKind::Paraphrase) => {
            Some("Rewrite the following text in a different way but keep the same meaning: ")
        }
        (ModelFamily::Generic, _) => None,
    }
}

/// Resolve a friendly model alias to its canonical identifier.
///
/// Unknown names pass through unchanged, so callers can hand in full
/// identifiers directly.
///
/// # Examples
///
/// ```
/// use gist::model::resolve_alias;
///
/// assert_eq!(resolve_alias("pegasus"), "google/pegasus-xsum");
/// assert_eq!(resolve_alias("my-org/my-model"), "my-org/my-model");
/// ```
#[must_use]
pub fn resolve_alias(name: &str) -> &str {
    match name.trim().to_lowercase().as_str() {
        "pegasus" => "google/pegasus-xsum",
        "bart" => "facebook/bart-large-cnn",
        "flan-t5" => "google/flan-t5-large",
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_resolution() {
        assert_eq!(
            ModelFamily::from_model_id("google/flan-t5-large"),
            ModelFamily::FlanT5
        );
        assert_eq!(ModelFamily::from_model_id("t5-base"), ModelFamily::T5);
        assert_eq!(
            ModelFamily::from_model_id("facebook/bart-large-cnn"),
            ModelFamily::Bart
        );
        assert_eq!(
            ModelFamily::from_model_id("google/pegasus-xsum"),
            ModelFamily::Generic
        );
    }

    #[test]
    fn flan_wins_over_t5() {
        // FLAN ids contain "t5"; order matters.
        assert_eq!(
            ModelFamily::from_model_id("FLAN-T5-small"),
            ModelFamily::FlanT5
        );
    }

    #[test]
    fn t5_prompts() {
        let p = render_prompt(ModelFamily::T5, PromptKind::Paraphrase, "hello");
        assert_eq!(p, "paraphrase: hello");
        let r = render_prompt(ModelFamily::T5, PromptKind::RewriteDifferently, "hello");
        assert_eq!(r, "rewrite completely differently: hello");
    }

    #[test]
    fn generic_prompts_are_bare() {
        for kind in [
            PromptKind::Paraphrase,
            PromptKind::ParaphraseRetry,
            PromptKind::RewriteDifferently,
        ] {
            assert_eq!(render_prompt(ModelFamily::Generic, kind, "text"), "text");
        }
    }

    #[test]
    fn bart_gets_anti_copy_constraints() {
        let base = DecodeParams::summary_beam(30, 80);
        let constrained = ModelFamily::Bart.constrain_summary_params(base.clone());
        assert_eq!(constrained.no_repeat_ngram_size, 3);
        assert!((constrained.repetition_penalty - 1.1).abs() < f64::EPSILON);

        let untouched = ModelFamily::Generic.constrain_summary_params(base.clone());
        assert_eq!(untouched, base);
    }

    #[test]
    fn alias_catalog() {
        assert_eq!(resolve_alias("bart"), "facebook/bart-large-cnn");
        assert_eq!(resolve_alias("FLAN-T5"), "google/flan-t5-large");
        assert_eq!(resolve_alias("unknown-model"), "unknown-model");
    }
}
