//! Statistical signals used by the validation gate.

pub mod combine;
pub mod context;
pub mod entropy;

pub use combine::{CONTEXT_WEIGHT, DETECTOR_WEIGHT, ENTROPY_WEIGHT, combine};
pub use context::ContextScorer;
pub use entropy::entropy;
