// libs/notification-cell/src/services/slack.rs
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use shared_config::AppConfig;

use crate::models::{NotificationChannel, NotificationError, NotificationEvent};
use crate::services::{ensure_success, Notifier};

/// Posts summary reports to one channel with `chat.postMessage`.
pub struct SlackNotifier {
    client: Client,
    bot_token: String,
    channel_id: String,
    base_url: String,
}

/// Slack answers 200 even for failures; `ok` carries the verdict.
#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    ts: Option<String>,
}

impl SlackNotifier {
    pub fn from_config(config: &AppConfig) -> Option<Self> {
        if !config.is_slack_configured() {
            return None;
        }

        Some(Self {
            client: Client::new(),
            bot_token: config.slack_bot_token.clone(),
            channel_id: config.slack_channel_id.clone(),
            base_url: config.slack_api_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    fn channel(&self) -> NotificationChannel {
        NotificationChannel::Slack
    }

    fn accepts(&self, event: &NotificationEvent) -> bool {
        matches!(event, NotificationEvent::SummaryReport { .. })
    }

    async fn notify(&self, event: &NotificationEvent) -> Result<(), NotificationError> {
        let NotificationEvent::SummaryReport { title, body } = event else {
            return Ok(());
        };

        let url = format!("{}/chat.postMessage", self.base_url);
        debug!("Posting '{}' to Slack channel {}", title, self.channel_id);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.bot_token)
            .json(&json!({
                "channel": self.channel_id,
                "text": format!("*{}*\n\n{}", title, body),
                "mrkdwn": true,
            }))
            .send()
            .await?;

        let reply: PostMessageResponse = ensure_success(self.channel(), response).await?.json().await?;

        if !reply.ok {
            return Err(NotificationError::Rejected {
                channel: self.channel(),
                message: reply.error.unwrap_or_else(|| "unknown_error".to_string()),
            });
        }

        info!(
            "Posted '{}' to Slack channel {} (ts {})",
            title,
            self.channel_id,
            reply.ts.as_deref().unwrap_or("-")
        );
        Ok(())
    }
}
