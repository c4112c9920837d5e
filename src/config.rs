//! Configuration for a single watched target.
//!
//! [`WatchConfig`] is loaded once (usually from TOML), validated once by
//! [`WatchConfig::validate`], and then treated as immutable for the lifetime
//! of the process.

use crate::error::{Result, WatchError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use watch_extract::Command;

/// How the target's content is retrieved.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalMode {
    /// A single HTTP request; the response body is the content.
    #[default]
    Plain,
    /// The page is rendered by a headless browser and the resulting DOM is
    /// the content.
    Rendered,
}

/// Top-level configuration for the watcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// URL of the watched resource.
    pub target: String,
    /// Plain HTTP or browser-rendered retrieval.
    pub retrieval: RetrievalMode,
    /// Extraction command applied to every fetched document.
    pub command: Command,
    /// CSS selector (markup commands) or JSON path (`json`).
    pub query: String,
    /// Base polling interval in milliseconds. Actual delays are jittered
    /// into `[base / 2, base)`.
    pub base_delay_ms: u64,
    /// Upper bound on a single fetch, in seconds.
    pub fetch_timeout_secs: u64,
    /// HTTP method used for plain retrieval.
    pub method: String,
    /// Custom User-Agent. If `None`, one realistic browser User-Agent is
    /// picked from a built-in list when the fetcher is built.
    pub user_agent: Option<String>,
    /// Headless browser binary for rendered retrieval. If `None`, common
    /// Chromium binaries are looked up on `PATH`.
    pub browser: Option<PathBuf>,
    /// Email alert settings. No alerts are sent when absent.
    pub notify: Option<NotifyConfig>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            target: String::new(),
            retrieval: RetrievalMode::Plain,
            command: Command::Html,
            query: String::new(),
            base_delay_ms: 5_000,
            fetch_timeout_secs: 30,
            method: "GET".to_owned(),
            user_agent: None,
            browser: None,
            notify: None,
        }
    }
}

/// Mandrill email alert settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Mandrill API key.
    pub api_key: String,
    /// Address that receives change alerts.
    pub recipient: String,
    /// Mandrill API base URL.
    pub endpoint: String,
    /// Alert subject line.
    pub subject: String,
    /// Sender address.
    pub from_email: String,
    /// Sender display name.
    pub from_name: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            recipient: String::new(),
            endpoint: "https://mandrillapp.com/api/1.0".to_owned(),
            subject: "Change Alert!".to_owned(),
            from_email: "notify@webwatcher.io".to_owned(),
            from_name: "WebWatcher".to_owned(),
        }
    }
}

impl WatchConfig {
    /// Create a configuration for `target` with default settings otherwise.
    pub fn new(target: impl Into<String>, command: Command, query: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            command,
            query: query.into(),
            ..Default::default()
        }
    }

    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `target` is a non-empty `http` or `https` URL
    /// - `base_delay_ms` and `fetch_timeout_secs` are greater than 0
    /// - `method` is a valid HTTP method
    /// - `notify`, when present, has an API key, a recipient and an endpoint
    pub fn validate(&self) -> Result<()> {
        if self.target.trim().is_empty() {
            return Err(WatchError::Config("target is required".into()));
        }
        let url = reqwest::Url::parse(&self.target)
            .map_err(|e| WatchError::Config(format!("invalid target \"{}\": {e}", self.target)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(WatchError::Config(format!(
                "target scheme must be http or https, got \"{}\"",
                url.scheme()
            )));
        }
        if self.base_delay_ms == 0 {
            return Err(WatchError::Config(
                "base_delay_ms must be greater than 0".into(),
            ));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(WatchError::Config(
                "fetch_timeout_secs must be greater than 0".into(),
            ));
        }
        self.http_method()?;
        if let Some(notify) = &self.notify {
            notify.validate()?;
        }
        Ok(())
    }

    /// Parse the configured HTTP method.
    pub fn http_method(&self) -> Result<reqwest::Method> {
        reqwest::Method::from_bytes(self.method.to_ascii_uppercase().as_bytes())
            .map_err(|_| WatchError::Config(format!("invalid HTTP method \"{}\"", self.method)))
    }

    /// Base polling interval.
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    /// Upper bound on a single fetch.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Parse configuration from TOML text, falling back to defaults for
    /// missing fields.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Config`] if the TOML is malformed or names an
    /// unsupported command.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| WatchError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| WatchError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `~/.config/webwatch/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("webwatch").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("webwatch")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/webwatch-config/config.toml")
        }
    }
}

impl NotifyConfig {
    fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(WatchError::Config("notify.api_key is required".into()));
        }
        if self.recipient.trim().is_empty() {
            return Err(WatchError::Config("notify.recipient is required".into()));
        }
        if self.endpoint.trim().is_empty() {
            return Err(WatchError::Config("notify.endpoint must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    fn valid() -> WatchConfig {
        WatchConfig::new("https://example.com/page", Command::Text, "div")
    }

    #[test]
    fn default_config_has_sensible_values() {
        let config = WatchConfig::default();
        assert_eq!(config.retrieval, RetrievalMode::Plain);
        assert_eq!(config.command, Command::Html);
        assert_eq!(config.base_delay_ms, 5_000);
        assert_eq!(config.fetch_timeout_secs, 30);
        assert_eq!(config.method, "GET");
        assert!(config.notify.is_none());
    }

    #[test]
    fn valid_config_passes_validation() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn missing_target_rejected() {
        let config = WatchConfig::default();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("target is required"));
    }

    #[test]
    fn non_http_target_rejected() {
        let config = WatchConfig {
            target: "ftp://example.com".into(),
            ..valid()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("scheme"));
    }

    #[test]
    fn zero_delay_rejected() {
        let config = WatchConfig {
            base_delay_ms: 0,
            ..valid()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("base_delay_ms"));
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = WatchConfig {
            fetch_timeout_secs: 0,
            ..valid()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("fetch_timeout_secs"));
    }

    #[test]
    fn invalid_method_rejected() {
        let config = WatchConfig {
            method: "GE T".into(),
            ..valid()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("HTTP method"));
    }

    #[test]
    fn lowercase_method_accepted() {
        let config = WatchConfig {
            method: "post".into(),
            ..valid()
        };
        assert_eq!(config.http_method().unwrap(), reqwest::Method::POST);
    }

    #[test]
    fn notify_without_recipient_rejected() {
        let config = WatchConfig {
            notify: Some(NotifyConfig {
                api_key: "key".into(),
                ..Default::default()
            }),
            ..valid()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("recipient"));
    }

    #[test]
    fn notify_defaults_match_alert_mail() {
        let notify = NotifyConfig::default();
        assert_eq!(notify.subject, "Change Alert!");
        assert_eq!(notify.from_email, "notify@webwatcher.io");
        assert_eq!(notify.from_name, "WebWatcher");
    }

    #[test]
    fn parses_partial_toml() {
        let config = WatchConfig::from_toml_str(
            r#"
            target = "https://news.ycombinator.com"
            retrieval = "rendered"
            command = "count"
            query = ".athing"
            base_delay_ms = 60000

            [notify]
            api_key = "k"
            recipient = "ops@example.com"
            "#,
        )
        .unwrap();
        assert_eq!(config.retrieval, RetrievalMode::Rendered);
        assert_eq!(config.command, Command::Count);
        assert_eq!(config.base_delay(), Duration::from_secs(60));
        assert_eq!(config.fetch_timeout_secs, 30);
        let notify = config.notify.as_ref().unwrap();
        assert_eq!(notify.subject, "Change Alert!");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unsupported_command_in_toml_rejected() {
        let err = WatchConfig::from_toml_str(
            r#"
            target = "https://example.com"
            command = "foo"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("unsupported command"));
    }

    #[test]
    fn unknown_retrieval_mode_rejected() {
        let result = WatchConfig::from_toml_str(
            r#"
            target = "https://example.com"
            retrieval = "telepathy"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = valid();
        config.base_delay_ms = 1234;
        config.user_agent = Some("CustomBot/1.0".into());

        config.save_to_file(&path).unwrap();
        let loaded = WatchConfig::from_file(&path).unwrap();
        assert_eq!(loaded.target, config.target);
        assert_eq!(loaded.command, Command::Text);
        assert_eq!(loaded.base_delay_ms, 1234);
        assert_eq!(loaded.user_agent.as_deref(), Some("CustomBot/1.0"));
    }

    #[test]
    fn from_file_nonexistent_returns_error() {
        let result = WatchConfig::from_file(Path::new("/nonexistent/path/config.toml"));
        assert!(matches!(result, Err(WatchError::Io(_))));
    }
}
