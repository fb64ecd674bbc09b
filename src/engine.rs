use crate::candidate::{Candidate, Source};
use crate::config::{ConfigError, EngineConfig, FailurePolicy, PiiConfig};
use crate::detectors::{
    DetectorError, EntityRecognizer, PatternMatch, PatternMatcher, RecognizedEntity,
};
use crate::gate::Validator;
use crate::merge::merge;
use crate::schema::DetectionReport;
use crate::text::CharIndex;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    #[error("{layer} detection layer failed: {source}")]
    Detector {
        layer: Source,
        source: DetectorError,
    },
}

type SourceOutputs = (
    Result<Vec<RecognizedEntity>, DetectorError>,
    Result<Vec<PatternMatch>, DetectorError>,
);

/// Runs both detection layers, merges their candidates and validates the
/// survivors.
///
/// The engine holds no per-call state, so one engine can serve concurrent
/// `detect` calls.
pub struct DetectionEngine {
    config: EngineConfig,
    validator: Validator,
    recognizer: Option<Box<dyn EntityRecognizer>>,
    matcher: Option<Box<dyn PatternMatcher>>,
}

impl DetectionEngine {
    /// Build an engine from configuration, with the configured pattern set as
    /// its pattern layer and no learned layer.
    pub fn new(config: &PiiConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let matcher = config.pattern_matcher()?;
        Ok(Self {
            config: config.engine.clone(),
            validator: config.validator(),
            recognizer: None,
            matcher: Some(Box::new(matcher)),
        })
    }

    /// An engine without any detection layer attached.
    pub fn bare(config: EngineConfig, validator: Validator) -> Self {
        Self {
            config,
            validator,
            recognizer: None,
            matcher: None,
        }
    }

    pub fn with_recognizer<R: EntityRecognizer + 'static>(mut self, recognizer: R) -> Self {
        self.recognizer = Some(Box::new(recognizer));
        self
    }

    pub fn with_pattern_matcher<M: PatternMatcher + 'static>(mut self, matcher: M) -> Self {
        self.matcher = Some(Box::new(matcher));
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.config.on_detector_failure = policy;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn detect(&self, text: &str) -> Result<DetectionReport, DetectError> {
        if text.is_empty() {
            return Ok(DetectionReport::empty());
        }

        let index = CharIndex::new(text);
        let (learned, patterns) = self.run_sources(text);

        let mut degraded = Vec::new();
        let mut pooled = Vec::new();
        match learned {
            Ok(entities) => pooled.extend(self.learned_candidates(text, &index, entities)),
            Err(error) => self.on_failure(Source::Learned, error, &mut degraded)?,
        }
        match patterns {
            Ok(matches) => pooled.extend(pattern_candidates(text, &index, matches)),
            Err(error) => self.on_failure(Source::Pattern, error, &mut degraded)?,
        }

        let pooled_count = pooled.len();
        let merged = merge(pooled);
        let merged_count = merged.len();
        let validated = self.validator.validate(text, merged);

        debug!(
            chars = index.char_len(),
            pooled = pooled_count,
            merged = merged_count,
            validated = validated.len(),
            "detection finished"
        );

        Ok(DetectionReport::from_candidates(&validated).with_degraded_layers(degraded))
    }

    /// Detect over many documents, in input order.
    ///
    /// Batches larger than `parallel_threshold` run in parallel when the
    /// `parallel` feature is enabled.
    pub fn detect_batch(&self, texts: &[&str]) -> Vec<Result<DetectionReport, DetectError>> {
        #[cfg(feature = "parallel")]
        {
            let threshold = self.config.parallel_threshold;
            if threshold > 0 && texts.len() > threshold {
                use rayon::prelude::*;
                return texts.par_iter().map(|text| self.detect(text)).collect();
            }
        }
        texts.iter().map(|text| self.detect(text)).collect()
    }

    fn run_sources(&self, text: &str) -> SourceOutputs {
        let learned = || match &self.recognizer {
            Some(recognizer) => recognizer.recognize(text),
            None => Ok(Vec::new()),
        };
        let patterns = || match &self.matcher {
            Some(matcher) => matcher.match_patterns(text),
            None => Ok(Vec::new()),
        };

        #[cfg(feature = "parallel")]
        {
            if self.config.parallel_sources {
                return rayon::join(learned, patterns);
            }
        }
        (learned(), patterns())
    }

    fn on_failure(
        &self,
        layer: Source,
        error: DetectorError,
        degraded: &mut Vec<Source>,
    ) -> Result<(), DetectError> {
        match self.config.on_detector_failure {
            FailurePolicy::Fail => Err(DetectError::Detector {
                layer,
                source: error,
            }),
            FailurePolicy::Degrade => {
                warn!(%layer, %error, "detection layer failed, continuing without it");
                degraded.push(layer);
                Ok(())
            }
        }
    }

    fn accepts_label(&self, label: &str) -> bool {
        let labels = &self.config.learned_labels;
        labels.is_empty() || labels.iter().any(|l| l.eq_ignore_ascii_case(label))
    }

    fn learned_candidates(
        &self,
        text: &str,
        index: &CharIndex,
        entities: Vec<RecognizedEntity>,
    ) -> Vec<Candidate> {
        entities
            .into_iter()
            .filter(|e| self.accepts_label(&e.label))
            .filter_map(|e| {
                let (start, end) = checked_span(e.start, e.end, index)?;
                let span_text = pick_text(e.text, text, index, start, end)?;
                Candidate::learned(span_text, e.label, e.score, start, end)
                    .map_err(|err| debug!(%err, "dropping malformed learned entity"))
                    .ok()
            })
            .collect()
    }
}

fn pattern_candidates(text: &str, index: &CharIndex, matches: Vec<PatternMatch>) -> Vec<Candidate> {
    matches
        .into_iter()
        .filter_map(|m| {
            let (start, end) = checked_span(m.start, m.end, index)?;
            let span_text = pick_text(m.text, text, index, start, end)?;
            Candidate::pattern(span_text, m.label, start, end)
                .map_err(|err| debug!(%err, pattern = %m.pattern_name, "dropping malformed match"))
                .ok()
        })
        .collect()
}

/// Convert collaborator offsets to a valid span within the text, or `None`.
fn checked_span(start: i64, end: i64, index: &CharIndex) -> Option<(usize, usize)> {
    let span = usize::try_from(start)
        .ok()
        .zip(usize::try_from(end).ok())
        .filter(|&(s, e)| s < e && e <= index.char_len());
    if span.is_none() {
        debug!(start, end, len = index.char_len(), "dropping candidate with invalid span");
    }
    span
}

/// Collaborator text, falling back to the source slice when it is empty.
fn pick_text(reported: String, text: &str, index: &CharIndex, start: usize, end: usize) -> Option<String> {
    if !reported.is_empty() {
        return Some(reported);
    }
    index.slice(text, start, end).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::test_utils::{
        FailingPatternMatcher, FailingRecognizer, StubPatternMatcher, StubRecognizer, entity_in,
        match_in,
    };

    const TEXT: &str = "John Smith's SSN is 123-45-6789 and his phone is 555-123-4567.";

    fn engine() -> DetectionEngine {
        DetectionEngine::new(&PiiConfig::default()).unwrap()
    }

    #[test]
    fn empty_text_yields_empty_report() {
        let engine = engine().with_recognizer(FailingRecognizer::default());
        let report = engine.detect("").unwrap();
        assert_eq!(report, DetectionReport::empty());
    }

    #[test]
    fn pattern_layer_alone_finds_identifiers() {
        let report = engine().detect(TEXT).unwrap();
        let types: Vec<_> = report.pii_detected.iter().map(|d| d.pii_type.as_str()).collect();
        assert_eq!(types, ["Social Security Number", "Phone Number"]);
        assert_eq!(report.pii_detected[0].position, [20, 31]);
        assert!(report.pii_detected.iter().all(|d| d.layer == Source::Pattern));
    }

    #[test]
    fn learned_entities_outside_label_set_are_ignored() {
        let recognizer = StubRecognizer::new(vec![
            entity_in(TEXT, "John Smith", "PER", 0.99),
            entity_in(TEXT, "phone", "MISC", 0.99),
        ]);
        let engine = DetectionEngine::bare(EngineConfig::default(), Validator::default().with_min_confidence(0.0))
            .with_recognizer(recognizer);
        let report = engine.detect(TEXT).unwrap();
        let labels: Vec<_> = report.pii_detected.iter().map(|d| d.pii_type.as_str()).collect();
        assert_eq!(labels, ["PER"]);
    }

    #[test]
    fn empty_label_set_accepts_everything() {
        let config = EngineConfig {
            learned_labels: Vec::new(),
            ..EngineConfig::default()
        };
        let recognizer = StubRecognizer::new(vec![entity_in(TEXT, "phone", "MISC", 0.99)]);
        let engine = DetectionEngine::bare(config, Validator::default().with_min_confidence(0.0))
            .with_recognizer(recognizer);
        assert_eq!(engine.detect(TEXT).unwrap().pii_detected.len(), 1);
    }

    #[test]
    fn malformed_collaborator_output_is_dropped() {
        let len = TEXT.chars().count() as i64;
        let bad = |start, end| RecognizedEntity {
            text: "x".to_string(),
            label: "PER".to_string(),
            score: 0.99,
            start,
            end,
        };
        let recognizer = StubRecognizer::new(vec![
            bad(5, 5),
            bad(8, 3),
            bad(-2, 4),
            bad(len - 2, len + 1),
            RecognizedEntity {
                score: 1.7,
                ..entity_in(TEXT, "John Smith", "PER", 0.0)
            },
        ]);
        let matcher = StubPatternMatcher::new(vec![PatternMatch {
            end: len + 10,
            ..match_in(TEXT, "555-123-4567", "phone", "Phone Number")
        }]);
        let engine = DetectionEngine::bare(EngineConfig::default(), Validator::default().with_min_confidence(0.0))
            .with_recognizer(recognizer)
            .with_pattern_matcher(matcher);

        let report = engine.detect(TEXT).unwrap();
        assert!(report.is_empty());
        assert!(report.degraded_layers.is_empty());
    }

    #[test]
    fn empty_collaborator_text_falls_back_to_source_slice() {
        let recognizer = StubRecognizer::new(vec![RecognizedEntity {
            text: String::new(),
            ..entity_in(TEXT, "John Smith", "PER", 0.99)
        }]);
        let engine = DetectionEngine::bare(EngineConfig::default(), Validator::default().with_min_confidence(0.0))
            .with_recognizer(recognizer);
        let report = engine.detect(TEXT).unwrap();
        assert_eq!(report.pii_detected[0].text, "John Smith");
    }

    #[test]
    fn failing_layer_fails_the_call_by_default() {
        let engine = engine().with_recognizer(FailingRecognizer::default());
        match engine.detect(TEXT) {
            Err(DetectError::Detector { layer, source }) => {
                assert_eq!(layer, Source::Learned);
                assert!(matches!(source, DetectorError::Unavailable(_)));
            }
            other => panic!("expected detector failure, got {other:?}"),
        }
    }

    #[test]
    fn degrade_policy_keeps_surviving_layer() {
        let engine = engine()
            .with_recognizer(FailingRecognizer::default())
            .with_failure_policy(FailurePolicy::Degrade);
        let report = engine.detect(TEXT).unwrap();
        assert_eq!(report.summary.total_pii_found, 2);
        assert_eq!(report.degraded_layers, vec![Source::Learned]);
    }

    #[test]
    fn degrade_policy_with_both_layers_failing_is_empty_but_well_formed() {
        let engine = engine()
            .with_recognizer(FailingRecognizer::default())
            .with_pattern_matcher(FailingPatternMatcher)
            .with_failure_policy(FailurePolicy::Degrade);
        let report = engine.detect(TEXT).unwrap();
        assert!(report.is_empty());
        assert_eq!(report.summary.average_confidence, 0.0);
        assert_eq!(report.degraded_layers, vec![Source::Learned, Source::Pattern]);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn parallel_sources_match_sequential() {
        let recognizer = StubRecognizer::new(vec![entity_in(TEXT, "John Smith", "PER", 0.99)]);
        let sequential = engine().with_recognizer(recognizer.clone());

        let mut config = PiiConfig::default();
        config.engine.parallel_sources = true;
        let parallel = DetectionEngine::new(&config).unwrap().with_recognizer(recognizer);

        assert_eq!(sequential.detect(TEXT).unwrap(), parallel.detect(TEXT).unwrap());
    }

    #[test]
    fn batch_keeps_input_order() {
        let mut config = PiiConfig::default();
        config.engine.parallel_threshold = 1;
        let engine = DetectionEngine::new(&config).unwrap();

        let texts = ["no pii here", TEXT, "", "ssn or social security number 987-65-4321"];
        let reports: Vec<_> = engine
            .detect_batch(&texts)
            .into_iter()
            .map(Result::unwrap)
            .collect();

        assert_eq!(reports.len(), 4);
        assert!(reports[0].is_empty());
        assert_eq!(reports[1].summary.total_pii_found, 2);
        assert!(reports[2].is_empty());
        assert_eq!(reports[3].pii_detected[0].text, "987-65-4321");
    }
}
