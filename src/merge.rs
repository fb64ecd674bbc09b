//! Overlap resolution across all detectors.

use crate::candidate::Candidate;
use std::cmp::Ordering;
use tracing::trace;

/// Sort order of the sweep: by start, then higher confidence first.
///
/// The trailing keys only break exact ties so the merge result never depends
/// on the order candidates were pooled in.
fn sweep_order(a: &Candidate, b: &Candidate) -> Ordering {
    a.start
        .cmp(&b.start)
        .then_with(|| b.confidence.total_cmp(&a.confidence))
        .then_with(|| b.end.cmp(&a.end))
        .then_with(|| a.detector.rank().cmp(&b.detector.rank()))
        .then_with(|| a.label.cmp(&b.label))
        .then_with(|| a.text.cmp(&b.text))
}

/// Collapse overlapping candidates into a left-to-right, non-overlapping list.
///
/// Each candidate is compared against the most recently kept one only. When
/// they overlap the strictly more confident candidate wins; on an exact tie
/// the one kept first stays.
pub fn merge(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.sort_by(sweep_order);

    let mut merged: Vec<Candidate> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        match merged.last_mut() {
            Some(last) if candidate.overlaps(last) => {
                if candidate.confidence > last.confidence {
                    trace!(
                        kept = %candidate.label,
                        dropped = %last.label,
                        start = candidate.start,
                        "overlap resolved in favour of later candidate"
                    );
                    *last = candidate;
                } else {
                    trace!(
                        kept = %last.label,
                        dropped = %candidate.label,
                        start = candidate.start,
                        "overlap resolved in favour of kept candidate"
                    );
                }
            }
            _ => merged.push(candidate),
        }
    }

    merged
}
