//! Multi-layer PII detection.
//!
//! Candidates from a learned entity recognizer and a deterministic pattern
//! matcher are pooled, merged into one non-overlapping set and validated
//! against a fused statistical confidence.

pub mod candidate;
pub mod config;
pub mod detectors;
pub mod engine;
pub mod gate;
pub mod merge;
pub mod schema;
pub mod scoring;
pub mod text;

pub use candidate::{Candidate, CandidateError, Source};
pub use config::{ConfigError, FailurePolicy, PiiConfig};
pub use engine::{DetectError, DetectionEngine};
pub use schema::DetectionReport;
