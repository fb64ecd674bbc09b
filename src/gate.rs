//! Validation gate: statistical scoring and the minimum-confidence filter.

use crate::candidate::{Candidate, Source};
use crate::scoring::combine::DEFAULT_ENTROPY_THRESHOLD;
use crate::scoring::{ContextScorer, combine, entropy};
use crate::text::CharIndex;
use tracing::trace;

/// Default minimum fused confidence for a candidate to be reported
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.85;

/// Scores merged candidates and keeps the ones above `min_confidence`.
#[derive(Debug, Clone)]
pub struct Validator {
    pub context: ContextScorer,
    pub entropy_threshold: f64,
    pub min_confidence: f64,
}

impl Validator {
    pub fn new(context: ContextScorer, entropy_threshold: f64, min_confidence: f64) -> Self {
        Self {
            context,
            entropy_threshold,
            min_confidence,
        }
    }

    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    /// Fused confidence of one candidate within `full_text`.
    pub fn fused_confidence(&self, full_text: &str, index: &CharIndex, candidate: &Candidate) -> f64 {
        let entropy_value = entropy(&candidate.text);
        let context_score = self.context.score_with_index(full_text, index, candidate);
        combine(
            candidate.detector_confidence,
            context_score,
            entropy_value,
            self.entropy_threshold,
        )
    }

    /// Overwrite each candidate's confidence with its fused value and drop the
    /// ones below `min_confidence`.
    ///
    /// Scoring always starts from the detector confidence, so validating an
    /// already validated list reproduces the same values.
    pub fn validate(&self, full_text: &str, candidates: Vec<Candidate>) -> Vec<Candidate> {
        let index = CharIndex::new(full_text);

        candidates
            .into_iter()
            .filter_map(|mut candidate| {
                let fused = self.fused_confidence(full_text, &index, &candidate);
                if fused < self.min_confidence {
                    trace!(
                        label = %candidate.label,
                        start = candidate.start,
                        fused,
                        "candidate below confidence threshold"
                    );
                    return None;
                }
                candidate.confidence = fused;
                candidate.source = Source::Fused;
                Some(candidate)
            })
            .collect()
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(
            ContextScorer::default(),
            DEFAULT_ENTROPY_THRESHOLD,
            DEFAULT_MIN_CONFIDENCE,
        )
    }
}

/// Validate `candidates` against `full_text` with the given validator.
pub fn validate(full_text: &str, candidates: Vec<Candidate>, validator: &Validator) -> Vec<Candidate> {
    validator.validate(full_text, candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_with_supporting_context_passes() {
        // "social" and "ssn" give a context score of 0.6
        let text = "Social: SSN 123-45-6789";
        let c = Candidate::pattern("123-45-6789", "SSN", 12, 23).unwrap();
        let validated = Validator::default().validate(text, vec![c]);

        assert_eq!(validated.len(), 1);
        assert!((validated[0].confidence - 0.88).abs() < 1e-9);
        assert_eq!(validated[0].source, Source::Fused);
        assert_eq!(validated[0].detector, Source::Pattern);
        assert_eq!(validated[0].detector_confidence, 1.0);
    }

    #[test]
    fn weak_learned_candidate_is_dropped() {
        let text = "We met Bob today";
        let c = Candidate::learned("Bob", "PER", 0.5, 7, 10).unwrap();
        assert!(Validator::default().validate(text, vec![c]).is_empty());
    }

    #[test]
    fn threshold_is_inclusive() {
        // 1.0 * 0.6 + 0.3 * 0.3 + 0.1, just under 0.79 in floating point
        let text = "phone 555-123-4567";
        let c = Candidate::pattern("555-123-4567", "PHONE", 6, 18).unwrap();
        let index = CharIndex::new(text);
        let fused = Validator::default().fused_confidence(text, &index, &c);
        let validator = Validator::default().with_min_confidence(fused);
        assert_eq!(validator.validate(text, vec![c.clone()]).len(), 1);

        let stricter = Validator::default().with_min_confidence(0.8);
        assert!(stricter.validate(text, vec![c]).is_empty());
    }

    #[test]
    fn revalidation_is_idempotent() {
        let text = "Call my phone number 555-123-4567, account 4532-1234-5678-9012";
        let candidates = vec![
            Candidate::pattern("555-123-4567", "PHONE", 21, 33).unwrap(),
            Candidate::pattern("4532-1234-5678-9012", "CARD", 43, 62).unwrap(),
        ];
        let validator = Validator::default();
        let once = validator.validate(text, candidates);
        let twice = validate(text, once.clone(), &validator);

        assert!(!once.is_empty());
        assert_eq!(once, twice);
    }

    #[test]
    fn confidences_stay_in_bounds() {
        let text = "ssn social credit card phone email 123-45-6789";
        let c = Candidate::pattern("123-45-6789", "SSN", 35, 46).unwrap();
        let validated = Validator::default().validate(text, vec![c]);
        assert_eq!(validated.len(), 1);
        assert!((0.0..=1.0).contains(&validated[0].confidence));
    }
}
