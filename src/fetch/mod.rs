//! Content retrieval.
//!
//! A [`Fetcher`] turns the configured target into raw text. Two
//! implementations exist: [`HttpFetcher`] issues a single HTTP request and
//! [`RenderedFetcher`] lets a headless browser execute the page first.
//! Failures are reported as [`WatchError::Fetch`](crate::WatchError::Fetch)
//! and cost the loop one cycle, never the process.

pub mod http;
pub mod rendered;

use crate::config::{RetrievalMode, WatchConfig};
use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub use http::HttpFetcher;
pub use rendered::RenderedFetcher;

/// Raw content returned by a fetcher, with timing for observability.
#[derive(Debug, Clone)]
pub struct Fetched {
    /// Response body or rendered DOM.
    pub body: String,
    /// HTTP status, when the transport exposes one.
    pub status: Option<u16>,
    /// Wall time spent retrieving the content.
    pub elapsed: Duration,
}

/// Retrieval contract used by the observation loop.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Retrieve the current content of `target`.
    async fn fetch(&self, target: &str) -> Result<Fetched>;

    /// Short label for logs (`plain`, `rendered`, ...).
    fn mode(&self) -> &'static str;
}

/// Build the fetcher matching `config.retrieval`.
///
/// # Errors
///
/// Returns [`WatchError::Config`](crate::WatchError::Config) if the HTTP
/// client cannot be built or no headless browser can be located.
pub fn fetcher_for(config: &WatchConfig) -> Result<Box<dyn Fetcher>> {
    match config.retrieval {
        RetrievalMode::Plain => Ok(Box::new(HttpFetcher::new(config)?)),
        RetrievalMode::Rendered => Ok(Box::new(RenderedFetcher::new(config)?)),
    }
}
