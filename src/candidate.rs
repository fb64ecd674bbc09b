use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Which detection layer a candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Learned named-entity recognizer
    Learned,
    /// Deterministic pattern matcher
    Pattern,
    /// Accepted by the validation gate
    Fused,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Learned => "learned",
            Source::Pattern => "pattern",
            Source::Fused => "fused",
        }
    }

    // Deterministic ordering for merge tie-breaks: exact pattern matches sort
    // ahead of model guesses. `Fused` only shows up as a detector when a
    // candidate is built with it directly.
    pub(crate) fn rank(&self) -> u8 {
        match self {
            Source::Pattern => 0,
            Source::Learned => 1,
            Source::Fused => 2,
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CandidateError {
    #[error("empty span: start {start} must be less than end {end}")]
    EmptySpan { start: usize, end: usize },
    #[error("candidate text is empty")]
    EmptyText,
    #[error("confidence {0} is outside [0, 1]")]
    ConfidenceOutOfRange(f64),
}

/// A span proposed by one detector, flowing through merge and validation.
///
/// Offsets are half-open character offsets into the source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub text: String,
    pub label: String,
    /// Current confidence: the detector score until the gate overwrites it
    /// with the fused value.
    pub confidence: f64,
    /// Raw detector score, kept so re-validation fuses from the same input.
    pub detector_confidence: f64,
    pub start: usize,
    pub end: usize,
    pub source: Source,
    /// Contributing detector, kept for diagnostics after fusion.
    pub detector: Source,
}

impl Candidate {
    pub fn new(
        text: impl Into<String>,
        label: impl Into<String>,
        confidence: f64,
        start: usize,
        end: usize,
        source: Source,
    ) -> Result<Self, CandidateError> {
        let text = text.into();
        if start >= end {
            return Err(CandidateError::EmptySpan { start, end });
        }
        if text.is_empty() {
            return Err(CandidateError::EmptyText);
        }
        if !(0.0..=1.0).contains(&confidence) {
            return Err(CandidateError::ConfidenceOutOfRange(confidence));
        }

        Ok(Self {
            text,
            label: label.into(),
            confidence,
            detector_confidence: confidence,
            start,
            end,
            source,
            detector: source,
        })
    }

    /// Pattern matches are exact, so they always enter at full confidence.
    pub fn pattern(
        text: impl Into<String>,
        label: impl Into<String>,
        start: usize,
        end: usize,
    ) -> Result<Self, CandidateError> {
        Self::new(text, label, 1.0, start, end, Source::Pattern)
    }

    pub fn learned(
        text: impl Into<String>,
        label: impl Into<String>,
        score: f64,
        start: usize,
        end: usize,
    ) -> Result<Self, CandidateError> {
        Self::new(text, label, score, start, end, Source::Learned)
    }

    pub fn overlaps(&self, other: &Candidate) -> bool {
        self.start < other.end && other.start < self.end
    }
}
