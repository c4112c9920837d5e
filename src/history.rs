//! In-memory observation log.
//!
//! History grows only when the derived value changes. Repeated polls that
//! see the same value bump the repeat counter of the newest entry instead of
//! appending, so each entry stands for one maximal run of equal values.
//! Nothing is persisted; the log lives as long as the process.

use crate::differ::DiffArtifact;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use watch_extract::DerivedValue;

/// One run of identical derived values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// When the run started.
    pub timestamp: DateTime<Utc>,
    /// The value observed throughout the run.
    pub value: DerivedValue,
    /// Difference from the previous run (or from an empty baseline).
    pub diff: DiffArtifact,
    /// Number of consecutive cycles that produced `value`.
    pub repeat_count: u32,
}

impl Observation {
    /// Count one more cycle with the same value.
    pub fn bump_repeat(&mut self) {
        self.repeat_count = self.repeat_count.saturating_add(1);
    }
}

/// Append-only, chronologically ordered log of observations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    entries: Vec<Observation>,
}

impl History {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new run starting now and return it.
    pub fn record(&mut self, value: DerivedValue, diff: DiffArtifact) -> &Observation {
        self.entries.push(Observation {
            timestamp: Utc::now(),
            value,
            diff,
            repeat_count: 1,
        });
        let index = self.entries.len() - 1;
        &self.entries[index]
    }

    /// Extend the newest run by one cycle. Returns the updated observation,
    /// or `None` when the history is empty.
    pub fn bump_repeat(&mut self) -> Option<&Observation> {
        let last = self.entries.last_mut()?;
        last.bump_repeat();
        Some(&*last)
    }

    /// The newest observation.
    pub fn last(&self) -> Option<&Observation> {
        self.entries.last()
    }

    /// All observations, oldest first.
    pub fn entries(&self) -> &[Observation] {
        &self.entries
    }

    /// Number of recorded runs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been observed yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Owned copy of the log, safe to hand to readers outside the loop.
    pub fn snapshot(&self) -> Vec<Observation> {
        self.entries.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use watch_extract::Command;

    fn text(s: &str) -> DerivedValue {
        DerivedValue::Text(s.to_owned())
    }

    fn empty_diff() -> DiffArtifact {
        DiffArtifact::empty(Command::Text)
    }

    #[test]
    fn new_history_is_empty() {
        let history = History::new();
        assert!(history.is_empty());
        assert!(history.last().is_none());
    }

    #[test]
    fn record_appends_with_repeat_one() {
        let mut history = History::new();
        let observation = history.record(text("a"), empty_diff());
        assert_eq!(observation.repeat_count, 1);
        assert_eq!(observation.value, text("a"));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn bump_repeat_mutates_last_in_place() {
        let mut history = History::new();
        history.record(text("a"), empty_diff());
        history.record(text("b"), empty_diff());
        let bumped = history.bump_repeat().expect("non-empty");
        assert_eq!(bumped.value, text("b"));
        assert_eq!(bumped.repeat_count, 2);
        assert_eq!(history.len(), 2);
        assert_eq!(history.entries()[0].repeat_count, 1);
    }

    #[test]
    fn bump_repeat_on_empty_history_is_none() {
        let mut history = History::new();
        assert!(history.bump_repeat().is_none());
    }

    #[test]
    fn entries_are_chronological() {
        let mut history = History::new();
        history.record(text("a"), empty_diff());
        history.record(text("b"), empty_diff());
        let entries = history.entries();
        assert!(entries[0].timestamp <= entries[1].timestamp);
        assert_eq!(entries[1].value, text("b"));
    }

    #[test]
    fn snapshot_is_detached() {
        let mut history = History::new();
        history.record(text("a"), empty_diff());
        let snapshot = history.snapshot();
        history.bump_repeat();
        assert_eq!(snapshot[0].repeat_count, 1);
        assert_eq!(history.entries()[0].repeat_count, 2);
    }

    #[test]
    fn serializes_as_array() {
        let mut history = History::new();
        history.record(text("a"), empty_diff());
        let encoded = serde_json::to_value(&history).expect("serialize");
        assert!(encoded.is_array());
        assert_eq!(encoded[0]["repeat_count"], 1);
    }
}
