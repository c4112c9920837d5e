//! Browser-rendered retrieval.
//!
//! Runs a headless Chromium-family browser with `--dump-dom`, so content
//! produced by client-side scripts is visible to the extractor. Each fetch
//! spawns a fresh browser process which is killed if it outlives the
//! configured fetch timeout.

use super::http::user_agent_for;
use super::{Fetched, Fetcher};
use crate::config::WatchConfig;
use crate::error::{Result, WatchError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

/// Browser binaries probed on `PATH`, in order.
const BROWSER_CANDIDATES: &[&str] = &[
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
];

/// Fetches the target by dumping the DOM of a headless browser.
pub struct RenderedFetcher {
    browser: PathBuf,
    user_agent: String,
    timeout: Duration,
}

impl RenderedFetcher {
    /// Build a fetcher from the watch configuration.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Config`] if the configured browser does not
    /// exist or none of the known browsers is on `PATH`.
    pub fn new(config: &WatchConfig) -> Result<Self> {
        let browser = locate_browser(config.browser.as_deref())?;
        tracing::debug!(browser = %browser.display(), "headless browser located");
        Ok(Self {
            browser,
            user_agent: user_agent_for(config),
            timeout: config.fetch_timeout(),
        })
    }

    /// Arguments passed to the browser for `target`.
    fn args(&self, target: &str) -> Vec<String> {
        vec![
            "--headless".to_owned(),
            "--disable-gpu".to_owned(),
            "--no-first-run".to_owned(),
            format!("--user-agent={}", self.user_agent),
            "--dump-dom".to_owned(),
            target.to_owned(),
        ]
    }
}

#[async_trait]
impl Fetcher for RenderedFetcher {
    async fn fetch(&self, target: &str) -> Result<Fetched> {
        tracing::info!(url = target, "rendering target");
        let started = Instant::now();

        let child = tokio::process::Command::new(&self.browser)
            .args(self.args(target))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                WatchError::Fetch(format!(
                    "failed to start {}: {e}",
                    self.browser.display()
                ))
            })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                WatchError::Fetch(format!(
                    "rendering {target} exceeded {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| WatchError::Fetch(format!("browser process failed: {e}")))?;

        let elapsed = started.elapsed();
        tracing::info!(
            exit = ?output.status.code(),
            elapsed_ms = elapsed.as_millis() as u64,
            "browser returned"
        );

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(WatchError::Fetch(format!(
                "browser exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(Fetched {
            body: String::from_utf8_lossy(&output.stdout).into_owned(),
            status: None,
            elapsed,
        })
    }

    fn mode(&self) -> &'static str {
        "rendered"
    }
}

/// Resolve the browser binary: the configured path, else the first known
/// browser found on `PATH`.
fn locate_browser(configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = configured {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        return which::which(path).map_err(|_| {
            WatchError::Config(format!("headless browser not found: {}", path.display()))
        });
    }

    BROWSER_CANDIDATES
        .iter()
        .find_map(|name| which::which(name).ok())
        .ok_or_else(|| {
            WatchError::Config(format!(
                "no headless browser found on PATH (tried {})",
                BROWSER_CANDIDATES.join(", ")
            ))
        })
}
