//! Candidate sources.
//!
//! The engine consumes two collaborators: a learned entity recognizer and a
//! deterministic pattern matcher. Both report character offsets into the text
//! they were given.

use serde::{Deserialize, Serialize};

pub mod patterns;
pub mod precomputed;
pub mod test_utils;

pub use patterns::{PatternDef, PatternSet, RegexPatternMatcher};
pub use precomputed::{EntityFileRecognizer, PrecomputedRecognizer};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DetectorError {
    #[error("detector unavailable: {0}")]
    Unavailable(String),
    #[error("detection failed: {0}")]
    Failed(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// An entity reported by a learned recognizer.
///
/// Offsets are signed because they come from outside the crate and are
/// checked before becoming candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedEntity {
    pub text: String,
    pub label: String,
    pub score: f64,
    pub start: i64,
    pub end: i64,
}

/// A span matched by a deterministic pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternMatch {
    pub text: String,
    /// Key of the pattern in its set, e.g. `ssn`
    pub pattern_name: String,
    /// Reported category, e.g. `Social Security Number`
    pub label: String,
    pub start: i64,
    pub end: i64,
}

pub trait EntityRecognizer: Send + Sync {
    fn name(&self) -> &str;
    fn recognize(&self, text: &str) -> Result<Vec<RecognizedEntity>, DetectorError>;
}

pub trait PatternMatcher: Send + Sync {
    fn name(&self) -> &str;
    fn match_patterns(&self, text: &str) -> Result<Vec<PatternMatch>, DetectorError>;
}
