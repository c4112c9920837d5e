//! Email alerts through the Mandrill transactional mail API.

use super::summary::render_html;
use super::{ChangeEvent, Notifier};
use crate::config::NotifyConfig;
use crate::error::{Result, WatchError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tag attached to every alert so they can be filtered in Mandrill.
const ALERT_TAG: &str = "change-alert";

/// Request timeout for the Mandrill API.
const SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Sends change alerts as HTML email via `messages/send.json`.
pub struct MandrillNotifier {
    client: reqwest::Client,
    config: NotifyConfig,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    key: &'a str,
    message: Message<'a>,
    #[serde(rename = "async")]
    is_async: bool,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    html: String,
    subject: &'a str,
    from_email: &'a str,
    from_name: &'a str,
    to: Vec<Recipient<'a>>,
    tags: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
struct Recipient<'a> {
    email: &'a str,
}

/// Per-recipient delivery result returned by Mandrill.
#[derive(Debug, Deserialize)]
struct SendResult {
    email: String,
    status: String,
    #[serde(default)]
    reject_reason: Option<String>,
}

impl MandrillNotifier {
    /// Build a notifier from alert settings.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Config`] if the HTTP client cannot be constructed.
    pub fn new(config: NotifyConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .map_err(|e| WatchError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    fn send_url(&self) -> String {
        format!(
            "{}/messages/send.json",
            self.config.endpoint.trim_end_matches('/')
        )
    }

    fn request<'a>(&'a self, event: &ChangeEvent) -> SendRequest<'a> {
        SendRequest {
            key: &self.config.api_key,
            message: Message {
                html: render_html(event),
                subject: &self.config.subject,
                from_email: &self.config.from_email,
                from_name: &self.config.from_name,
                to: vec![Recipient {
                    email: &self.config.recipient,
                }],
                tags: vec![ALERT_TAG],
            },
            is_async: false,
        }
    }
}

#[async_trait]
impl Notifier for MandrillNotifier {
    async fn send(&self, event: &ChangeEvent) -> Result<()> {
        let response = self
            .client
            .post(self.send_url())
            .json(&self.request(event))
            .send()
            .await
            .map_err(|e| WatchError::Notify(format!("Mandrill request failed: {e}")))?
            .error_for_status()
            .map_err(|e| WatchError::Notify(format!("Mandrill HTTP error: {e}")))?;

        let results: Vec<SendResult> = response
            .json()
            .await
            .map_err(|e| WatchError::Notify(format!("unexpected Mandrill response: {e}")))?;

        if let Some(failed) = results
            .iter()
            .find(|r| matches!(r.status.as_str(), "rejected" | "invalid"))
        {
            return Err(WatchError::Notify(format!(
                "Mandrill {} {}: {}",
                failed.status,
                failed.email,
                failed.reject_reason.as_deref().unwrap_or("no reason given")
            )));
        }

        tracing::info!(recipient = %self.config.recipient, "sent change alert");
        Ok(())
    }

    fn destination(&self) -> String {
        format!("mandrill:{}", self.config.recipient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WatchConfig;
    use crate::differ::diff_values;
    use crate::history::History;
    use watch_extract::{Command, DerivedValue};

    fn notify_config() -> NotifyConfig {
        NotifyConfig {
            api_key: "test-key".into(),
            recipient: "ops@example.com".into(),
            endpoint: "https://mandrill.test/api/1.0/".into(),
            ..Default::default()
        }
    }

    fn event() -> ChangeEvent {
        let config = WatchConfig::new("https://example.com", Command::Text, "div");
        let mut history = History::new();
        let value = DerivedValue::Text("1".into());
        history.record(value.clone(), diff_values(None, &value, Command::Text));
        ChangeEvent::from_history(&config, &history).expect("event")
    }

    #[test]
    fn send_url_strips_trailing_slash() {
        let notifier = MandrillNotifier::new(notify_config()).expect("notifier");
        assert_eq!(
            notifier.send_url(),
            "https://mandrill.test/api/1.0/messages/send.json"
        );
    }

    #[test]
    fn request_payload_shape() {
        let notifier = MandrillNotifier::new(notify_config()).expect("notifier");
        let payload = serde_json::to_value(notifier.request(&event())).expect("serialize");
        assert_eq!(payload["key"], "test-key");
        assert_eq!(payload["async"], false);
        assert_eq!(payload["message"]["subject"], "Change Alert!");
        assert_eq!(payload["message"]["from_email"], "notify@webwatcher.io");
        assert_eq!(payload["message"]["to"][0]["email"], "ops@example.com");
        assert_eq!(payload["message"]["tags"][0], "change-alert");
        assert!(payload["message"]["html"]
            .as_str()
            .expect("html")
            .contains("<h2>Diff</h2>"));
    }

    #[test]
    fn destination_names_recipient() {
        let notifier = MandrillNotifier::new(notify_config()).expect("notifier");
        assert_eq!(notifier.destination(), "mandrill:ops@example.com");
    }
}
