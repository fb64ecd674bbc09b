use insta::assert_snapshot;
use piisense::detectors::test_utils::{FailingRecognizer, StubRecognizer, entity_in};
use piisense::{DetectionEngine, DetectionReport, FailurePolicy, PiiConfig};

const JOHN: &str = "John Smith's SSN is 123-45-6789 and his phone is 555-123-4567.";

fn engine() -> DetectionEngine {
    DetectionEngine::new(&PiiConfig::default()).unwrap()
}

fn pretty(report: &DetectionReport) -> String {
    serde_json::to_string_pretty(report).unwrap()
}

#[test]
fn snapshot_empty_text() {
    let report = engine().detect("").unwrap();
    assert_snapshot!("empty_text", pretty(&report));
}

#[test]
fn snapshot_learned_and_pattern_layers() {
    let recognizer = StubRecognizer::new(vec![entity_in(JOHN, "John Smith", "PER", 0.998)]);
    let report = engine().with_recognizer(recognizer).detect(JOHN).unwrap();
    assert_snapshot!("learned_and_pattern_layers", pretty(&report));
}

#[test]
fn snapshot_degraded_learned_layer() {
    let report = engine()
        .with_recognizer(FailingRecognizer::default())
        .with_failure_policy(FailurePolicy::Degrade)
        .detect(JOHN)
        .unwrap();
    assert_snapshot!("degraded_learned_layer", pretty(&report));
}
