//! Change detection between consecutive derived values.
//!
//! [`compare`] decides whether the newest value differs from the last
//! recorded observation and produces a serializable [`DiffArtifact`]: a
//! character diff for markup and scalar values, a structural diff for JSON.

use crate::history::Observation;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use similar::{ChangeTag, TextDiff};
use std::time::Duration;
use watch_extract::{Command, DerivedValue};

/// Time allowed for finding a minimal diff before settling for a coarser one.
const DIFF_TIMEOUT: Duration = Duration::from_millis(500);

/// Combined input size in bytes above which text is diffed per line.
const CHAR_DIFF_LIMIT: usize = 64 * 1024;

/// Verdict of comparing the current value against the last observation.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    /// Whether the value changed. Always `true` against an empty history.
    pub changed: bool,
    /// Difference against the previous value (or an empty baseline).
    pub diff: DiffArtifact,
}

/// Serializable difference between two derived values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DiffArtifact {
    /// Character-level diff of the rendered values.
    Text {
        /// Runs of equal, inserted or deleted characters in order.
        spans: Vec<DiffSpan>,
    },
    /// Path-level diff of two JSON values.
    Structural {
        /// One entry per added, removed or modified path.
        changes: Vec<JsonChange>,
    },
}

/// Operation applied to a run of characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffOp {
    /// Present in both values.
    Equal,
    /// Present only in the current value.
    Insert,
    /// Present only in the previous value.
    Delete,
}

/// A maximal run of characters sharing one [`DiffOp`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSpan {
    /// What happened to this run.
    pub op: DiffOp,
    /// The characters in the run.
    pub text: String,
}

/// Kind of change at a JSON path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Path exists only in the current value.
    Added,
    /// Path exists only in the previous value.
    Removed,
    /// Path exists in both with different values.
    Modified,
}

/// A single structural difference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonChange {
    /// JSON pointer to the changed location (`""` is the root).
    pub path: String,
    /// What kind of change happened.
    pub kind: ChangeKind,
    /// Previous value, absent for additions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old: Option<Value>,
    /// Current value, absent for removals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new: Option<Value>,
}

/// Compare `current` against the last recorded observation.
///
/// With no previous observation the value is reported as changed and diffed
/// against an empty baseline; the caller decides that a baseline never
/// notifies. Equal values report `changed = false` with an empty diff.
pub fn compare(
    previous: Option<&Observation>,
    current: &DerivedValue,
    command: Command,
) -> Comparison {
    match previous {
        Some(prev) if prev.value == *current => Comparison {
            changed: false,
            diff: DiffArtifact::empty(command),
        },
        Some(prev) => Comparison {
            changed: true,
            diff: diff_values(Some(&prev.value), current, command),
        },
        None => Comparison {
            changed: true,
            diff: diff_values(None, current, command),
        },
    }
}

/// Diff two values with the strategy `command` calls for.
pub fn diff_values(
    previous: Option<&DerivedValue>,
    current: &DerivedValue,
    command: Command,
) -> DiffArtifact {
    if command.is_structured() {
        let mut changes = Vec::new();
        match previous {
            Some(previous) => diff_json("", &as_json(previous), &as_json(current), &mut changes),
            None => changes.push(JsonChange {
                path: String::new(),
                kind: ChangeKind::Added,
                old: None,
                new: Some(as_json(current)),
            }),
        }
        DiffArtifact::Structural { changes }
    } else {
        let old = previous.map(ToString::to_string).unwrap_or_default();
        DiffArtifact::Text {
            spans: diff_chars(&old, &current.to_string()),
        }
    }
}

/// Character-level diff with consecutive same-op characters merged.
///
/// Inputs over 64 KiB combined are diffed per line instead, and
/// the search is cut off after 500 ms, after which the remaining
/// region is reported as one deletion plus one insertion.
pub fn diff_chars(old: &str, new: &str) -> Vec<DiffSpan> {
    let mut config = TextDiff::configure();
    config.timeout(DIFF_TIMEOUT);
    let diff = if old.len() + new.len() > CHAR_DIFF_LIMIT {
        tracing::debug!(
            old_bytes = old.len(),
            new_bytes = new.len(),
            "large values, diffing by line"
        );
        config.diff_lines(old, new)
    } else {
        config.diff_chars(old, new)
    };
    let mut spans: Vec<DiffSpan> = Vec::new();

    for change in diff.iter_all_changes() {
        let op = match change.tag() {
            ChangeTag::Equal => DiffOp::Equal,
            ChangeTag::Insert => DiffOp::Insert,
            ChangeTag::Delete => DiffOp::Delete,
        };
        match spans.last_mut() {
            Some(last) if last.op == op => last.text.push_str(change.value()),
            _ => spans.push(DiffSpan {
                op,
                text: change.value().to_owned(),
            }),
        }
    }

    spans
}

/// Recursive structural diff, collecting changes under `path`.
pub fn diff_json(path: &str, old: &Value, new: &Value, changes: &mut Vec<JsonChange>) {
    match (old, new) {
        (Value::Object(a), Value::Object(b)) => {
            for (key, old_value) in a {
                let child = format!("{path}/{}", escape_pointer(key));
                match b.get(key) {
                    Some(new_value) => diff_json(&child, old_value, new_value, changes),
                    None => changes.push(JsonChange {
                        path: child,
                        kind: ChangeKind::Removed,
                        old: Some(old_value.clone()),
                        new: None,
                    }),
                }
            }
            for (key, new_value) in b {
                if !a.contains_key(key) {
                    changes.push(JsonChange {
                        path: format!("{path}/{}", escape_pointer(key)),
                        kind: ChangeKind::Added,
                        old: None,
                        new: Some(new_value.clone()),
                    });
                }
            }
        }
        (Value::Array(a), Value::Array(b)) => {
            for (i, pair) in a.iter().zip(b.iter()).enumerate() {
                diff_json(&format!("{path}/{i}"), pair.0, pair.1, changes);
            }
            for (i, removed) in a.iter().enumerate().skip(b.len()) {
                changes.push(JsonChange {
                    path: format!("{path}/{i}"),
                    kind: ChangeKind::Removed,
                    old: Some(removed.clone()),
                    new: None,
                });
            }
            for (i, added) in b.iter().enumerate().skip(a.len()) {
                changes.push(JsonChange {
                    path: format!("{path}/{i}"),
                    kind: ChangeKind::Added,
                    old: None,
                    new: Some(added.clone()),
                });
            }
        }
        (old, new) if old != new => changes.push(JsonChange {
            path: path.to_owned(),
            kind: ChangeKind::Modified,
            old: Some(old.clone()),
            new: Some(new.clone()),
        }),
        _ => {}
    }
}

impl DiffArtifact {
    /// An artifact describing no difference.
    pub fn empty(command: Command) -> Self {
        if command.is_structured() {
            Self::Structural {
                changes: Vec::new(),
            }
        } else {
            Self::Text { spans: Vec::new() }
        }
    }

    /// Whether the artifact records any insertion, deletion or change.
    pub fn has_changes(&self) -> bool {
        match self {
            Self::Text { spans } => spans.iter().any(|s| s.op != DiffOp::Equal),
            Self::Structural { changes } => !changes.is_empty(),
        }
    }

    /// Plain-text rendering for alert bodies and logs.
    ///
    /// Text diffs mark deletions as `[-...-]` and insertions as `{+...+}`;
    /// structural diffs print one line per changed path.
    pub fn render(&self) -> String {
        match self {
            Self::Text { spans } => spans
                .iter()
                .map(|span| match span.op {
                    DiffOp::Equal => span.text.clone(),
                    DiffOp::Insert => format!("{{+{}+}}", span.text),
                    DiffOp::Delete => format!("[-{}-]", span.text),
                })
                .collect(),
            Self::Structural { changes } => changes
                .iter()
                .map(|change| {
                    let path = if change.path.is_empty() { "/" } else { &change.path };
                    match change.kind {
                        ChangeKind::Added => format!("+ {path}: {}", render_opt(&change.new)),
                        ChangeKind::Removed => format!("- {path}: {}", render_opt(&change.old)),
                        ChangeKind::Modified => format!(
                            "~ {path}: {} -> {}",
                            render_opt(&change.old),
                            render_opt(&change.new)
                        ),
                    }
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

fn render_opt(value: &Option<Value>) -> String {
    value.as_ref().map_or_else(String::new, Value::to_string)
}

fn as_json(value: &DerivedValue) -> Value {
    value
        .as_json()
        .cloned()
        .unwrap_or_else(|| Value::String(value.to_string()))
}

fn escape_pointer(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}
