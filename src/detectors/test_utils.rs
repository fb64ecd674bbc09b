//! Deterministic collaborators for tests.

use super::{
    DetectorError, EntityRecognizer, PatternMatch, PatternMatcher, RecognizedEntity,
};

/// Build a recognized entity, computing its span from the first occurrence of
/// `needle` in `text`.
///
/// # Example
///
/// ```rust
/// use piisense::detectors::test_utils::entity_in;
///
/// let entity = entity_in("Call John Smith", "John Smith", "PER", 0.99);
/// assert_eq!((entity.start, entity.end), (5, 15));
/// ```
pub fn entity_in(text: &str, needle: &str, label: &str, score: f64) -> RecognizedEntity {
    let (start, end) = char_span(text, needle);
    RecognizedEntity {
        text: needle.to_string(),
        label: label.to_string(),
        score,
        start,
        end,
    }
}

/// Build a pattern match for the first occurrence of `needle` in `text`.
pub fn match_in(text: &str, needle: &str, pattern_name: &str, label: &str) -> PatternMatch {
    let (start, end) = char_span(text, needle);
    PatternMatch {
        text: needle.to_string(),
        pattern_name: pattern_name.to_string(),
        label: label.to_string(),
        start,
        end,
    }
}

fn char_span(text: &str, needle: &str) -> (i64, i64) {
    let byte = text
        .find(needle)
        .unwrap_or_else(|| panic!("{needle:?} not found in {text:?}"));
    let start = text[..byte].chars().count() as i64;
    (start, start + needle.chars().count() as i64)
}

/// Recognizer that returns a fixed entity list for every text
#[derive(Debug, Clone, Default)]
pub struct StubRecognizer {
    pub entities: Vec<RecognizedEntity>,
}

impl StubRecognizer {
    pub fn new(entities: Vec<RecognizedEntity>) -> Self {
        Self { entities }
    }
}

impl EntityRecognizer for StubRecognizer {
    fn name(&self) -> &str {
        "stub"
    }

    fn recognize(&self, _text: &str) -> Result<Vec<RecognizedEntity>, DetectorError> {
        Ok(self.entities.clone())
    }
}

/// Recognizer whose model never loads
#[derive(Debug, Clone)]
pub struct FailingRecognizer {
    pub error: DetectorError,
}

impl Default for FailingRecognizer {
    fn default() -> Self {
        Self {
            error: DetectorError::Unavailable("model not loaded".to_string()),
        }
    }
}

impl EntityRecognizer for FailingRecognizer {
    fn name(&self) -> &str {
        "failing"
    }

    fn recognize(&self, _text: &str) -> Result<Vec<RecognizedEntity>, DetectorError> {
        Err(self.error.clone())
    }
}

/// Pattern matcher that returns a fixed match list for every text
#[derive(Debug, Clone, Default)]
pub struct StubPatternMatcher {
    pub matches: Vec<PatternMatch>,
}

impl StubPatternMatcher {
    pub fn new(matches: Vec<PatternMatch>) -> Self {
        Self { matches }
    }
}

impl PatternMatcher for StubPatternMatcher {
    fn name(&self) -> &str {
        "stub"
    }

    fn match_patterns(&self, _text: &str) -> Result<Vec<PatternMatch>, DetectorError> {
        Ok(self.matches.clone())
    }
}

/// Pattern matcher that always fails
#[derive(Debug, Clone, Default)]
pub struct FailingPatternMatcher;

impl PatternMatcher for FailingPatternMatcher {
    fn name(&self) -> &str {
        "failing"
    }

    fn match_patterns(&self, _text: &str) -> Result<Vec<PatternMatch>, DetectorError> {
        Err(DetectorError::Failed("pattern engine crashed".to_string()))
    }
}
