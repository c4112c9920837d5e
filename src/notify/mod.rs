//! Change alerts.
//!
//! When the loop records a change it hands a [`ChangeEvent`] to a
//! [`Notifier`]. Delivery failures are logged by the loop and never affect
//! history or scheduling.

pub mod mandrill;
pub mod summary;

use crate::config::WatchConfig;
use crate::differ::DiffArtifact;
use crate::error::Result;
use crate::history::{History, Observation};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use watch_extract::Command;

pub use mandrill::MandrillNotifier;

/// The part of the configuration included in alerts for context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// Watched URL.
    pub target: String,
    /// Extraction command.
    pub command: Command,
    /// Selector or JSON path.
    pub query: String,
    /// Alert recipient, if alerts are configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
}

impl From<&WatchConfig> for ConfigSnapshot {
    fn from(config: &WatchConfig) -> Self {
        Self {
            target: config.target.clone(),
            command: config.command,
            query: config.query.clone(),
            recipient: config.notify.as_ref().map(|n| n.recipient.clone()),
        }
    }
}

/// Immutable description of one detected change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Difference between the previous and the newest observation.
    pub diff: DiffArtifact,
    /// Configuration context.
    pub config: ConfigSnapshot,
    /// Full history at the time of the change, newest last.
    pub history: Vec<Observation>,
}

impl ChangeEvent {
    /// Build an event from the newest observation in `history`.
    ///
    /// Returns `None` when the history is empty.
    pub fn from_history(config: &WatchConfig, history: &History) -> Option<Self> {
        let newest = history.last()?;
        Some(Self {
            diff: newest.diff.clone(),
            config: ConfigSnapshot::from(config),
            history: history.snapshot(),
        })
    }

    /// The newest observation.
    pub fn newest(&self) -> Option<&Observation> {
        self.history.last()
    }
}

/// Outbound alert channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one change alert.
    async fn send(&self, event: &ChangeEvent) -> Result<()>;

    /// Human-readable description of where alerts go, for logs.
    fn destination(&self) -> String;
}
