//! Error types for the observation loop.

use watch_extract::ExtractError;

/// Top-level error type for webwatch.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// Invalid configuration, detected once at construction.
    #[error("config error: {0}")]
    Config(String),

    /// Extraction failed; the same content and query will fail again.
    #[error("extract error: {0}")]
    Extract(#[from] ExtractError),

    /// Retrieving the target failed (network, status, browser process).
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Delivering a change notification failed.
    #[error("notify error: {0}")]
    Notify(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WatchError {
    /// Whether this error must stop the observation loop.
    ///
    /// Configuration and extraction failures recur on every cycle. Fetch and
    /// notification failures are transient and only cost one cycle or one
    /// alert.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Extract(_) | Self::Io(_))
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, WatchError>;
