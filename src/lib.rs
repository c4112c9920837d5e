//! webwatch: poll a web resource and alert when a projection of it changes.
//!
//! # Architecture
//!
//! Each cycle of the [`ObservationLoop`] passes through independent stages:
//! - **Fetch**: plain HTTP via `reqwest`, or a headless browser's rendered DOM
//! - **Extract**: reduce the content with a [`Command`] and a CSS selector or
//!   JSON path (the `watch-extract` crate)
//! - **Compare**: diff against the newest [`History`] entry
//! - **Record**: append on change, bump the repeat counter otherwise
//! - **Notify**: send a Mandrill email alert for changes after the baseline
//!
//! The loop then sleeps a delay drawn from `[base / 2, base)` and repeats.

pub mod config;
pub mod differ;
pub mod error;
pub mod fetch;
pub mod history;
pub mod notify;
pub mod observer;

pub use config::{NotifyConfig, RetrievalMode, WatchConfig};
pub use differ::{Comparison, DiffArtifact, compare};
pub use error::{Result, WatchError};
pub use fetch::{Fetched, Fetcher, fetcher_for};
pub use history::{History, Observation};
pub use notify::{ChangeEvent, MandrillNotifier, Notifier};
pub use observer::{CycleOutcome, ObservationLoop};
pub use watch_extract::{Command, DerivedValue, NumericSum};
