//! The report produced by one `detect` call.

use crate::candidate::{Candidate, Source};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Round to three decimal places
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PiiDetection {
    pub text: String,
    #[serde(rename = "type")]
    pub pii_type: String,
    /// Fused confidence, three decimals
    pub confidence: f64,
    /// Half-open character span `[start, end]`
    pub position: [usize; 2],
    /// Detector that contributed the span
    pub layer: Source,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Summary {
    pub total_pii_found: usize,
    pub average_confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DetectionReport {
    pub pii_detected: Vec<PiiDetection>,
    pub summary: Summary,
    /// Layers that failed and were skipped under the degrade policy
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degraded_layers: Vec<Source>,
}

impl DetectionReport {
    pub fn empty() -> Self {
        Self::from_candidates(&[])
    }

    /// Build the report from validated candidates.
    pub fn from_candidates(candidates: &[Candidate]) -> Self {
        let total = candidates.len();
        let average = if total > 0 {
            candidates.iter().map(|c| c.confidence).sum::<f64>() / total as f64
        } else {
            0.0
        };

        Self {
            pii_detected: candidates
                .iter()
                .map(|c| PiiDetection {
                    text: c.text.clone(),
                    pii_type: c.label.clone(),
                    confidence: round3(c.confidence),
                    position: [c.start, c.end],
                    layer: c.detector,
                })
                .collect(),
            summary: Summary {
                total_pii_found: total,
                average_confidence: round3(average),
            },
            degraded_layers: Vec::new(),
        }
    }

    pub fn with_degraded_layers(mut self, layers: Vec<Source>) -> Self {
        self.degraded_layers = layers;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pii_detected.is_empty()
    }
}

impl Default for DetectionReport {
    fn default() -> Self {
        Self::empty()
    }
}
