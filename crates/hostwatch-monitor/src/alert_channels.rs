//! Telegram bot alert channel.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::MonitorError;

use super::alerts::{Alert, AlertChannel};

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Telegram bot channel.
pub struct TelegramChannel {
    bot_token: String,
    chat_id: String,
    api_base: String,
    client: reqwest::Client,
}

impl TelegramChannel {
    /// Create a new Telegram channel.
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Point the channel at a different bot API host.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Bound each delivery request.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, MonitorError> {
        self.client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    fn send_message_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.bot_token)
    }
}

#[async_trait]
impl AlertChannel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send(&self, alert: &Alert) -> Result<(), MonitorError> {
        let payload = serde_json::json!({
            "chat_id": self.chat_id,
            "text": alert.format_markdown(),
            "parse_mode": "Markdown"
        });

        // The URL embeds the bot token, so reqwest errors are stripped of it.
        let response = self
            .client
            .post(self.send_message_url())
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                MonitorError::AlertDelivery(format!(
                    "Telegram request failed: {}",
                    e.without_url()
                ))
            })?;

        if response.status().is_success() {
            debug!("Telegram alert sent successfully");
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(MonitorError::AlertDelivery(format!(
                "Telegram API returned {}: {}",
                status, body
            )))
        }
    }
}
