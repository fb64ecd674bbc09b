//! Fusion of the three validation signals into one confidence.

/// Weight of the detector's own confidence
pub const DETECTOR_WEIGHT: f64 = 0.6;
/// Weight of the surrounding-context score
pub const CONTEXT_WEIGHT: f64 = 0.3;
/// Weight of the entropy signal
pub const ENTROPY_WEIGHT: f64 = 0.1;

/// Entropy signal when the candidate text is above the threshold
pub const HIGH_ENTROPY_SIGNAL: f64 = 1.0;
/// Entropy signal otherwise: weak, never a rejection on its own
pub const LOW_ENTROPY_SIGNAL: f64 = 0.5;

/// Default entropy threshold separating identifiers from words
pub const DEFAULT_ENTROPY_THRESHOLD: f64 = 2.5;

/// Weighted sum of detector confidence, context score and entropy signal,
/// clamped to `[0, 1]`.
pub fn combine(
    detector_confidence: f64,
    context_score: f64,
    entropy_value: f64,
    entropy_threshold: f64,
) -> f64 {
    let entropy_signal = if entropy_value > entropy_threshold {
        HIGH_ENTROPY_SIGNAL
    } else {
        LOW_ENTROPY_SIGNAL
    };

    let fused = detector_confidence * DETECTOR_WEIGHT
        + context_score * CONTEXT_WEIGHT
        + entropy_signal * ENTROPY_WEIGHT;

    if fused.is_nan() {
        return 0.0;
    }
    fused.clamp(0.0, 1.0)
}
