//! Alert manager for dispatching alerts to channels.

use tracing::{error, info};

use hostwatch_config::TelegramConfig;

use crate::error::MonitorError;

use super::alert_channels::TelegramChannel;
use super::alerts::{Alert, AlertChannel, LogChannel};

/// Alert manager.
///
/// Delivery is fire-and-forget: a channel failure is logged and the alert is
/// dropped for that channel. Nothing is queued or retried.
pub struct AlertManager {
    channels: Vec<Box<dyn AlertChannel>>,
}

impl AlertManager {
    /// Create a new alert manager that only logs.
    pub fn new() -> Self {
        Self {
            channels: vec![Box::new(LogChannel)],
        }
    }

    /// Create from config.
    pub fn from_config(config: &TelegramConfig) -> Result<Self, MonitorError> {
        let mut manager = Self::new();

        if config.bot_token.is_empty() || config.chat_id.is_empty() {
            return Err(MonitorError::InvalidConfig(
                "Telegram bot token or chat ID not configured".to_string(),
            ));
        }

        info!("Adding Telegram alert channel");
        let channel = TelegramChannel::new(&config.bot_token, &config.chat_id)
            .with_api_base(&config.api_base)
            .with_timeout(config.request_timeout())?;
        manager.add_channel(Box::new(channel));

        Ok(manager)
    }

    /// Add a channel.
    pub fn add_channel(&mut self, channel: Box<dyn AlertChannel>) {
        self.channels.push(channel);
    }

    /// Get list of channel names.
    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    /// Send an alert to all channels.
    pub async fn send(&self, alert: &Alert) -> Vec<MonitorError> {
        let mut errors = Vec::new();

        for channel in &self.channels {
            if let Err(e) = channel.send(alert).await {
                error!("Failed to send alert '{}' via {}: {}", alert.title, channel.name(), e);
                errors.push(e);
            }
        }

        errors
    }
}

impl Default for AlertManager {
    fn default() -> Self {
        Self::new()
    }
}
