//! The observation loop.
//!
//! One cycle fetches the target, extracts the derived value, compares it
//! with the newest history entry, updates history and, on a change, sends an
//! alert. Cycles run strictly one after another with a jittered pause in
//! between; the loop owns its [`History`] exclusively.

use super::jitter::jittered_delay;
use crate::config::WatchConfig;
use crate::differ::compare;
use crate::error::Result;
use crate::fetch::Fetcher;
use crate::history::History;
use crate::notify::{ChangeEvent, Notifier};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, debug, error, info, info_span, warn};

/// What a single cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Fetching failed; history is untouched.
    Skipped,
    /// First observation, recorded without an alert.
    Baseline,
    /// Same value as the newest entry, whose repeat count is now `repeat_count`.
    Unchanged {
        /// Length of the current run of equal values.
        repeat_count: u32,
    },
    /// New value recorded. `notified` is true when an alert was delivered.
    Changed {
        /// Whether a notifier accepted the alert.
        notified: bool,
    },
}

impl CycleOutcome {
    /// Whether this cycle calls for an alert.
    pub fn should_notify(&self) -> bool {
        matches!(self, Self::Changed { .. })
    }
}

/// Drives fetch → extract → compare → record → notify for one target.
pub struct ObservationLoop {
    config: WatchConfig,
    fetcher: Box<dyn Fetcher>,
    notifier: Option<Box<dyn Notifier>>,
    history: History,
    span: Span,
    cancel: CancellationToken,
}

impl ObservationLoop {
    /// Create a loop for a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Config`](crate::WatchError::Config) if the
    /// configuration is invalid. Nothing is re-validated per cycle.
    pub fn new(
        config: WatchConfig,
        fetcher: Box<dyn Fetcher>,
        notifier: Option<Box<dyn Notifier>>,
    ) -> Result<Self> {
        config.validate()?;
        let span = info_span!(
            "watch",
            url = %config.target,
            command = %config.command,
            mode = fetcher.mode()
        );
        Ok(Self {
            config,
            fetcher,
            notifier,
            history: History::new(),
            span,
            cancel: CancellationToken::new(),
        })
    }

    /// Log every cycle inside `span` instead of the default `watch` span.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Stop the loop between cycles when `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that stops [`run`](Self::run) after the in-flight cycle.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Observations recorded so far.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Delay before the next cycle.
    pub fn next_delay(&self) -> Duration {
        jittered_delay(self.config.base_delay(), &mut rand::thread_rng())
    }

    /// Execute one cycle.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Extract`](crate::WatchError::Extract) when the
    /// content cannot be reduced with the configured command and query.
    /// Fetch and notification failures are logged and reported through the
    /// returned [`CycleOutcome`] instead.
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome> {
        let span = self.span.clone();
        self.cycle().instrument(span).await
    }

    async fn cycle(&mut self) -> Result<CycleOutcome> {
        let fetched = match self.fetcher.fetch(&self.config.target).await {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!(error = %e, "fetch failed, skipping cycle");
                return Ok(CycleOutcome::Skipped);
            }
        };
        debug!(
            status = ?fetched.status,
            elapsed_ms = fetched.elapsed.as_millis() as u64,
            bytes = fetched.body.len(),
            "content fetched"
        );

        let value = watch_extract::extract(&fetched.body, self.config.command, &self.config.query)?;
        let comparison = compare(self.history.last(), &value, self.config.command);

        if self.history.is_empty() {
            info!(value = %value, "recorded baseline");
            self.history.record(value, comparison.diff);
            return Ok(CycleOutcome::Baseline);
        }

        if !comparison.changed {
            let repeat_count = self
                .history
                .bump_repeat()
                .map_or(1, |observation| observation.repeat_count);
            let since_ms = self.history.last().map_or(0, |o| {
                (chrono::Utc::now() - o.timestamp).num_milliseconds()
            });
            info!(repeat_count, since_ms, "value unchanged");
            return Ok(CycleOutcome::Unchanged { repeat_count });
        }

        info!(value = %value, entries = self.history.len() + 1, "value changed");
        self.history.record(value, comparison.diff);
        let notified = self.notify().await;
        Ok(CycleOutcome::Changed { notified })
    }

    /// Send an alert for the newest observation. Failures are logged only.
    async fn notify(&self) -> bool {
        let Some(notifier) = &self.notifier else {
            debug!("no notifier configured");
            return false;
        };
        let Some(event) = ChangeEvent::from_history(&self.config, &self.history) else {
            return false;
        };
        match notifier.send(&event).await {
            Ok(()) => {
                info!(destination = %notifier.destination(), "change alert sent");
                true
            }
            Err(e) => {
                warn!(destination = %notifier.destination(), error = %e, "change alert failed");
                false
            }
        }
    }

    /// Run cycles until cancelled or a fatal error occurs.
    ///
    /// Cancellation is only observed between cycles, so a cycle that has
    /// started always finishes recording and alerting.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error; no further cycle is scheduled after it.
    pub async fn run(mut self) -> Result<History> {
        info!(
            parent: &self.span,
            base_delay_ms = self.config.base_delay_ms,
            "observation loop started"
        );

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            if let Err(e) = self.run_cycle().await {
                error!(parent: &self.span, error = %e, "fatal error, stopping observation loop");
                return Err(e);
            }

            let delay = self.next_delay();
            debug!(parent: &self.span, delay_ms = delay.as_millis() as u64, "next cycle scheduled");

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        info!(parent: &self.span, entries = self.history.len(), "observation loop stopped");
        Ok(self.history)
    }
}
