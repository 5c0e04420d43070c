//! The boundary to the external sequence-to-sequence generator.
//!
//! The generator itself (model weights, tokenizer, device placement) is an
//! external collaborator. This module owns the only long-lived state in
//! the crate: a process-wide cache of loaded generator handles, keyed by
//! model identifier, populated lazily and never evicted. First use of a
//! model id can block for minutes while weights load; subsequent calls
//! reuse the cached handle.
//!
//! Concurrent first-time loads of the *same* model id are serialized
//! (single-flight) so an expensive load happens once. Loads of different
//! ids proceed independently. A failed or cancelled load leaves its cache
//! slot unpopulated; later callers simply attempt the load again.
//!
//! No retry policy lives here. Controllers decide what to retry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::params::DecodeParams;

/// A loaded sequence-to-sequence generator.
///
/// Implementations wrap whatever inference runtime the caller uses; the
/// crate ships [`crate::MockGenerator`] for tests. `generate` is expected
/// to block for the duration of the decode.
pub trait Generator: Send + Sync {
    /// Run one generation call and return the raw decoded text.
    fn generate(&self, prompt: &str, params: &DecodeParams) -> Result<String>;

    /// The model identifier this generator was loaded for.
    fn model_id(&self) -> &str;
}

/// One generated output, paired with the parameters that produced it.
///
/// Immutable after creation: retries produce new candidates, they never
/// edit existing ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// Raw generated text.
    pub text: String,
    /// Parameters of the call that produced this text.
    pub decode_params: DecodeParams,
    /// Index of the source chunk, for per-chunk summary candidates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_chunk_index: Option<usize>,
}

/// A successful transform, handed to an optional caller-supplied history
/// hook. Fire-and-forget; the core never depends on it.
#[derive(Debug, Clone, Serialize)]
pub struct TransformRecord<'a> {
    /// The caller's input text.
    pub input: &'a str,
    /// The final output text.
    pub output: &'a str,
    /// Model identifier used.
    pub model_id: &'a str,
    /// Parameters of the final generation call.
    pub params: &'a DecodeParams,
}

/// Caller-supplied hook recording successful transforms.
pub type HistoryHook = Box<dyn Fn(TransformRecord<'_>) + Send + Sync>;

/// Loader invoked once per model identifier.
pub type GeneratorLoader = Box<dyn Fn(&str) -> Result<Arc<dyn Generator>> + Send + Sync>;

type CacheSlot = Arc<OnceCell<Arc<dyn Generator>>>;

/// Gateway around the external generator.
///
/// Owns the handle cache and nothing else; see the module docs for the
/// caching contract.
pub struct GenerationGateway {
    loader: GeneratorLoader,
    cache: Mutex<HashMap<String, CacheSlot>>,
}

impl GenerationGateway {
    /// Create a gateway with the given loader.
    ///
    /// The loader is called at most once per model identifier for the
    /// lifetime of the gateway, unless a load fails (failed loads are not
    /// negatively cached).
    pub fn new(loader: GeneratorLoader) -> Self {
        Self {
            loader,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Convenience constructor wrapping a single pre-built generator.
    ///
    /// Every model id resolves to `generator`. Used in tests and by
    /// callers that manage exactly one model.
    pub fn with_generator(generator: Arc<dyn Generator>) -> Self {
        Self::new(Box::new(move |_| Ok(Arc::clone(&generator))))
    }

    /// Run one generation call.
    ///
    /// Resolves the generator handle (loading it on first use per model
    /// id), dispatches, and wraps the output in a [`Candidate`]. The
    /// optional `deadline` is checked before dispatch and after return;
    /// the decode itself is an opaque blocking call this layer cannot
    /// preempt. Exceeding the deadline yields [`Error::GenerationTimeout`].
    pub fn generate(
        &self,
        model_id: &str,
        prompt: &str,
        params: &DecodeParams,
        deadline: Option<Instant>,
    ) -> Result<Candidate> {
        check_deadline(deadline)?;
        let generator = self.handle(model_id)?;
        check_deadline(deadline)?;
        let text = generator.generate(prompt, params)?;
        check_deadline(deadline)?;
        Ok(Candidate {
            text,
            decode_params: params.clone(),
            source_chunk_index: None,
        })
    }

    /// Number of model ids with a fully loaded handle.
    #[must_use]
    pub fn loaded_models(&self) -> usize {
        let map = lock(&self.cache);
        map.values().filter(|slot| slot.get().is_some()).count()
    }

    /// Resolve (and lazily load) the handle for `model_id`.
    ///
    /// The per-id `OnceCell` serializes concurrent first loads of the
    /// same id; a failed init leaves the cell empty, so no caller ever
    /// observes a half-initialized handle.
    fn handle(&self, model_id: &str) -> Result<Arc<dyn Generator>> {
        let slot = {
            let mut map = lock(&self.cache);
            map.entry(model_id.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };
        slot.get_or_try_init(|| {
            log::info!("loading generator for {model_id} (cold start may take minutes)");
            (self.loader)(model_id)
        })
        .cloned()
    }
}

fn check_deadline(deadline: Option<Instant>) -> Result<()> {
    match deadline {
        Some(d) if Instant::now() >= d => Err(Error::GenerationTimeout),
        _ => Ok(()),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    // A poisoned lock means a panic elsewhere; the map itself stays
    // valid (slots are OnceCells), so recover the guard.
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Upper(String);

    impl Generator for Upper {
        fn generate(&self, prompt: &str, _params: &DecodeParams) -> Result<String> {
            Ok(prompt.to_uppercase())
        }
        fn model_id(&self) -> &str {
            &self.0
        }
    }

    fn counting_gateway(loads: Arc<AtomicUsize>) -> GenerationGateway {
        GenerationGateway::new(Box::new(move |id| {
            loads.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(Upper(id.to_string())) as Arc<dyn Generator>)
        }))
    }

    #[test]
    fn loads_once_per_model_id() {
        let loads = Arc::new(AtomicUsize::new(0));
        let gateway = counting_gateway(loads.clone());
        let params = DecodeParams::summary_beam(30, 80);

        for _ in 0..3 {
            gateway.generate("model-a", "hi", &params, None).unwrap();
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);

        gateway.generate("model-b", "hi", &params, None).unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 2);
        assert_eq!(gateway.loaded_models(), 2);
    }

    #[test]
    fn failed_load_is_retried_next_call() {
        let loads = Arc::new(AtomicUsize::new(0));
        let inner = loads.clone();
        let gateway = GenerationGateway::new(Box::new(move |id| {
            let n = inner.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                Err(Error::unavailable("weights missing"))
            } else {
                Ok(Arc::new(Upper(id.to_string())) as Arc<dyn Generator>)
            }
        }));
        let params = DecodeParams::summary_beam(30, 80);

        let err = gateway.generate("m", "x", &params, None).unwrap_err();
        assert!(matches!(err, Error::GenerationUnavailable(_)));
        // The slot stays empty after the failure; the next call re-loads.
        assert_eq!(gateway.loaded_models(), 0);
        let ok = gateway.generate("m", "x", &params, None).unwrap();
        assert_eq!(ok.text, "X");
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn expired_deadline_times_out() {
        let loads = Arc::new(AtomicUsize::new(0));
        let gateway = counting_gateway(loads.clone());
        let params = DecodeParams::summary_beam(30, 80);
        let past = Instant::now() - Duration::from_secs(1);

        let err = gateway.generate("m", "x", &params, Some(past)).unwrap_err();
        assert!(matches!(err, Error::GenerationTimeout));
        // Timed out before dispatch, so nothing was loaded.
        assert_eq!(loads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn concurrent_first_loads_are_single_flight() {
        let loads = Arc::new(AtomicUsize::new(0));
        let inner = loads.clone();
        let gateway = Arc::new(GenerationGateway::new(Box::new(move |id| {
            inner.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(20));
            Ok(Arc::new(Upper(id.to_string())) as Arc<dyn Generator>)
        })));
        let params = DecodeParams::summary_beam(30, 80);

        std::thread::scope(|scope| {
            for _ in 0..4 {
                let gateway = Arc::clone(&gateway);
                let params = params.clone();
                scope.spawn(move || {
                    gateway.generate("shared", "hi", &params, None).unwrap();
                });
            }
        });
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }
}
