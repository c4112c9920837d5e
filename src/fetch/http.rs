//! Plain HTTP retrieval with a realistic browser User-Agent.
//!
//! The [`reqwest::Client`] is built once per fetcher with the configured
//! timeout, User-Agent and redirect policy, then reused for every cycle.

use super::{Fetched, Fetcher};
use crate::config::WatchConfig;
use crate::error::{Result, WatchError};
use async_trait::async_trait;
use rand::seq::SliceRandom;
use std::time::Instant;

/// Realistic browser User-Agent strings; one is picked per fetcher.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_5 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:133.0) Gecko/20100101 Firefox/133.0",
];

/// Fetches the target with one HTTP request per cycle.
pub struct HttpFetcher {
    client: reqwest::Client,
    method: reqwest::Method,
}

impl HttpFetcher {
    /// Build a fetcher from the watch configuration.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Config`] if the method is invalid or the client
    /// cannot be constructed.
    pub fn new(config: &WatchConfig) -> Result<Self> {
        let method = config.http_method()?;
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout())
            .user_agent(user_agent_for(config))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| WatchError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, method })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, target: &str) -> Result<Fetched> {
        tracing::info!(url = target, method = %self.method, "requesting target");
        let started = Instant::now();

        let response = self
            .client
            .request(self.method.clone(), target)
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| WatchError::Fetch(format!("request to {target} failed: {e}")))?;

        let status = response.status();
        tracing::info!(
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "request returned"
        );

        let response = response
            .error_for_status()
            .map_err(|e| WatchError::Fetch(format!("HTTP error from {target}: {e}")))?;

        let body = response
            .text()
            .await
            .map_err(|e| WatchError::Fetch(format!("reading body from {target} failed: {e}")))?;

        tracing::trace!(bytes = body.len(), "response body received");

        Ok(Fetched {
            body,
            status: Some(status.as_u16()),
            elapsed: started.elapsed(),
        })
    }

    fn mode(&self) -> &'static str {
        "plain"
    }
}

/// The configured User-Agent, or one picked from the built-in list.
pub fn user_agent_for(config: &WatchConfig) -> String {
    match config.user_agent {
        Some(ref custom) => custom.clone(),
        None => random_user_agent().to_owned(),
    }
}

/// Select a random User-Agent string from the rotation list.
pub fn random_user_agent() -> &'static str {
    let mut rng = rand::thread_rng();
    USER_AGENTS
        .choose(&mut rng)
        .copied()
        // USER_AGENTS is a non-empty const array; choose only returns None on empty slices
        .unwrap_or(USER_AGENTS[0])
}
