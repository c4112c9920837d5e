//! Derived values: the unit compared between observation cycles.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The result of applying a command to fetched content.
///
/// Equality is structural, so two cycles that extract the same text, count,
/// sum or JSON value compare equal regardless of where they came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum DerivedValue {
    /// Markup, text, or raw content.
    Text(String),
    /// Number of matching nodes.
    Count(usize),
    /// Integer sum over matching nodes.
    Sum(NumericSum),
    /// Parsed structured document (or an error payload describing why it
    /// could not be parsed).
    Json(serde_json::Value),
}

/// Outcome of summing the integers found in matching nodes.
///
/// A single non-numeric node poisons the whole sum, so a page that stops
/// rendering numbers shows up as a change instead of silently reading 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericSum {
    /// Every matching node parsed as an integer.
    Total(i64),
    /// At least one node had no leading integer, or the total overflowed.
    NotANumber,
}

impl NumericSum {
    /// Adds one parsed term, propagating the invalid state.
    pub fn add(self, term: Option<i64>) -> Self {
        match (self, term) {
            (Self::Total(acc), Some(n)) => acc.checked_add(n).map_or(Self::NotANumber, Self::Total),
            _ => Self::NotANumber,
        }
    }

    /// Returns the total when it is valid.
    pub fn total(&self) -> Option<i64> {
        match self {
            Self::Total(n) => Some(*n),
            Self::NotANumber => None,
        }
    }
}

impl Default for NumericSum {
    fn default() -> Self {
        Self::Total(0)
    }
}

impl fmt::Display for NumericSum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.total() {
            Some(n) => write!(f, "{n}"),
            None => f.write_str("NaN"),
        }
    }
}

impl DerivedValue {
    /// Returns the JSON payload for [`DerivedValue::Json`].
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for DerivedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Count(n) => write!(f, "{n}"),
            Self::Sum(sum) => write!(f, "{sum}"),
            Self::Json(v) => write!(f, "{v}"),
        }
    }
}
