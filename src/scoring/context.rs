use crate::candidate::Candidate;
use crate::text::CharIndex;

/// Weight of each distinct indicator found near a candidate.
pub const INDICATOR_WEIGHT: f64 = 0.3;

/// Default number of characters inspected on each side of a candidate.
pub const DEFAULT_WINDOW: usize = 50;

/// Default indicator vocabulary.
pub const DEFAULT_INDICATORS: &[&str] = &[
    "ssn", "social", "credit", "card", "phone", "email", "address", "number", "id", "account",
    "dob", "birth",
];

/// Scores a candidate by the indicator words found around it.
#[derive(Debug, Clone)]
pub struct ContextScorer {
    indicators: Vec<String>,
    window: usize,
}

impl ContextScorer {
    pub fn new<I, S>(indicators: I, window: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let indicators = indicators
            .into_iter()
            .map(|s| s.as_ref().trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        Self { indicators, window }
    }

    pub fn indicators(&self) -> &[String] {
        &self.indicators
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Score in `[0, 1]`; three or more distinct indicators saturate it.
    pub fn score(&self, full_text: &str, candidate: &Candidate) -> f64 {
        self.score_with_index(full_text, &CharIndex::new(full_text), candidate)
    }

    /// Same as [`score`](Self::score) with a prebuilt index of `full_text`.
    pub fn score_with_index(&self, full_text: &str, index: &CharIndex, candidate: &Candidate) -> f64 {
        let len = index.char_len();
        let from = candidate.start.saturating_sub(self.window).min(len);
        let to = candidate.end.saturating_add(self.window).min(len);
        let Some(window) = index.slice(full_text, from, to) else {
            return 0.0;
        };

        let context = window.to_lowercase();
        let found = self
            .indicators
            .iter()
            .filter(|indicator| context.contains(indicator.as_str()))
            .count();

        (found as f64 * INDICATOR_WEIGHT).min(1.0)
    }
}

impl Default for ContextScorer {
    fn default() -> Self {
        Self::new(DEFAULT_INDICATORS.iter().copied(), DEFAULT_WINDOW)
    }
}
