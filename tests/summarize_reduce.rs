//! End-to-end summarization tests: chunking, the reduce pass, alias
//! resolution, and gateway behavior under the controller.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use gist::prelude::*;
use gist::Generator;

fn long_document(words: usize) -> String {
    (0..words)
        .map(|i| format!("word{i}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[test]
fn empty_input_fails_before_any_generation() {
    let mock = Arc::new(MockGenerator::new("modelX"));
    let gateway = Arc::new(GenerationGateway::with_generator(mock.clone()));
    let err = gist::summarize(&gateway, "", LengthClass::Medium, "modelX").unwrap_err();
    assert!(matches!(err, Error::EmptyInput));
    assert_eq!(mock.call_count(), 0);
}

#[test]
fn short_document_is_one_generation_call() {
    let mock = Arc::new(MockGenerator::new("m").with_script(vec!["its summary"]));
    let gateway = Arc::new(GenerationGateway::with_generator(mock.clone()));
    let out = gist::summarize(&gateway, "a short document", LengthClass::Short, "m").unwrap();
    assert_eq!(out.as_text(), Some("its summary"));
    assert_eq!(mock.call_count(), 1);
}

#[test]
fn long_document_chunks_then_reduces() {
    let text = long_document(2000); // 3 chunks of <= 800 words
    let mock = Arc::new(MockGenerator::new("m").with_script(vec![
        "part one",
        "part two",
        "part three",
        "everything, reduced",
    ]));
    let gateway = Arc::new(GenerationGateway::with_generator(mock.clone()));
    let out = gist::summarize(&gateway, &text, LengthClass::Long, "m").unwrap();
    assert_eq!(out.as_text(), Some("everything, reduced"));
    assert_eq!(mock.call_count(), 4);

    let calls = mock.calls();
    // Chunk prompts partition the document in order.
    assert!(calls[0].prompt.starts_with("word0 "));
    assert!(calls[1].prompt.starts_with("word800 "));
    assert!(calls[2].prompt.starts_with("word1600 "));
    // Reduce prompt is the joined chunk summaries.
    assert_eq!(calls[3].prompt, "part one part two part three");
    // Long class bounds flow into every pass.
    for call in &calls {
        assert_eq!(call.params.max_new_tokens, 300);
    }
}

#[test]
fn friendly_alias_reaches_the_loader_resolved() {
    let loaded: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&loaded);
    let gateway = Arc::new(GenerationGateway::new(Box::new(move |model_id| {
        sink.lock().unwrap().push(model_id.to_string());
        Ok(Arc::new(MockGenerator::new(model_id).with_script(vec!["s"]))
            as Arc<dyn Generator>)
    })));
    gist::summarize(&gateway, "text to summarize", LengthClass::Medium, "pegasus").unwrap();
    assert_eq!(loaded.lock().unwrap().as_slice(), ["google/pegasus-xsum"]);
}

#[test]
fn generator_handle_is_reused_across_calls() {
    let loads = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&loads);
    let gateway = Arc::new(GenerationGateway::new(Box::new(move |model_id| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(
            Arc::new(MockGenerator::new(model_id).with_script(vec!["one", "two", "three"]))
                as Arc<dyn Generator>,
        )
    })));
    let summarizer = Summarizer::new(Arc::clone(&gateway));
    for _ in 0..3 {
        summarizer
            .summarize("short text", LengthClass::Short, "m", None)
            .unwrap();
    }
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[test]
fn unavailable_generator_propagates_unchanged() {
    let gateway = Arc::new(GenerationGateway::new(Box::new(|_| {
        Err(Error::GenerationUnavailable("weights not found".into()))
    })));
    let err = gist::summarize(&gateway, "some text", LengthClass::Medium, "m").unwrap_err();
    match err {
        Error::GenerationUnavailable(message) => assert!(message.contains("weights")),
        other => panic!("expected GenerationUnavailable, got {other:?}"),
    }
}

#[test]
fn expired_deadline_surfaces_timeout() {
    let mock = Arc::new(MockGenerator::new("m").with_script(vec!["unused"]));
    let gateway = Arc::new(GenerationGateway::with_generator(mock.clone()));
    let summarizer = Summarizer::new(gateway);
    let past = gist::deadline_in(std::time::Duration::from_secs(0));
    let err = summarizer
        .summarize("some text", LengthClass::Medium, "m", Some(past))
        .unwrap_err();
    assert!(matches!(err, Error::GenerationTimeout));
}
