//! Per-subject sync watermarks.
//!
//! # Invariants
//! - A subject never seen has boundary `TIMESTAMP_MIN`.
//! - `advance` is a monotonic max; a boundary only goes back via `reset`.
//! - State is process memory only; a restart re-fetches history once.

use crate::model::record::{Timestamp, TIMESTAMP_MIN};
use std::collections::BTreeMap;

/// Boundary below which a subject's records are assumed stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Watermark {
    pub subject: String,
    pub boundary: Timestamp,
}

/// Owns every subject's watermark.
///
/// Mutation takes `&mut self`; callers sharing one tracker are serialized
/// by whoever owns it.
#[derive(Debug, Default)]
pub struct SyncTracker {
    boundaries: BTreeMap<String, Timestamp>,
}

impl SyncTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn boundary_for(&self, subject: &str) -> Timestamp {
        self.boundaries
            .get(subject)
            .copied()
            .unwrap_or(TIMESTAMP_MIN)
    }

    /// Moves the boundary forward to `timestamp`; smaller values are ignored.
    ///
    /// Returns the boundary in effect after the call.
    pub fn advance(&mut self, subject: &str, timestamp: Timestamp) -> Timestamp {
        let entry = self
            .boundaries
            .entry(subject.to_string())
            .or_insert(TIMESTAMP_MIN);
        if timestamp > *entry {
            *entry = timestamp;
        }
        *entry
    }

    /// Advances past the newest timestamp in `created_at`, if any.
    pub fn advance_past<I>(&mut self, subject: &str, created_at: I) -> Option<Timestamp>
    where
        I: IntoIterator<Item = Timestamp>,
    {
        let newest = created_at.into_iter().max()?;
        Some(self.advance(subject, newest.saturating_add(1)))
    }

    pub fn watermark(&self, subject: &str) -> Watermark {
        Watermark {
            subject: subject.to_string(),
            boundary: self.boundary_for(subject),
        }
    }

    /// Subjects with a recorded boundary, sorted.
    pub fn subjects(&self) -> Vec<String> {
        self.boundaries.keys().cloned().collect()
    }

    /// Forgets a subject so its next sync fetches full history.
    pub fn reset(&mut self, subject: &str) -> bool {
        self.boundaries.remove(subject).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::SyncTracker;
    use crate::model::record::TIMESTAMP_MIN;

    #[test]
    fn unseen_subject_starts_at_minimum() {
        let tracker = SyncTracker::new();
        assert_eq!(tracker.boundary_for("alice"), TIMESTAMP_MIN);
    }

    #[test]
    fn batch_max_plus_one_becomes_boundary() {
        let mut tracker = SyncTracker::new();
        let boundary = tracker.advance_past("alice", [400, 1000, 20]);
        assert_eq!(boundary, Some(1001));
        assert_eq!(tracker.boundary_for("alice"), 1001);
    }

    #[test]
    fn advance_never_moves_backward() {
        let mut tracker = SyncTracker::new();
        let mut previous = tracker.boundary_for("alice");
        for value in [50, 10, 70, 70, 3, 200, 199] {
            let current = tracker.advance("alice", value);
            assert!(current >= previous);
            previous = current;
        }
        assert_eq!(tracker.boundary_for("alice"), 200);
    }

    #[test]
    fn empty_batch_leaves_boundary_untouched() {
        let mut tracker = SyncTracker::new();
        tracker.advance("bob", 10);
        assert_eq!(tracker.advance_past("bob", Vec::new()), None);
        assert_eq!(tracker.boundary_for("bob"), 10);
    }

    #[test]
    fn subjects_are_independent_and_resettable() {
        let mut tracker = SyncTracker::new();
        tracker.advance("alice", 5);
        tracker.advance("bob", 9);
        assert_eq!(tracker.subjects(), vec!["alice", "bob"]);

        assert!(tracker.reset("alice"));
        assert_eq!(tracker.boundary_for("alice"), TIMESTAMP_MIN);
        assert_eq!(tracker.watermark("bob").boundary, 9);
        assert!(!tracker.reset("carol"));
    }
}
