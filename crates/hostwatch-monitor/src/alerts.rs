//! Alert types and core trait definitions.

#[cfg(test)]
#[path = "alerts_tests.rs"]
mod tests;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::MonitorError;

/// Timestamp layout used in every alert.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// What an alert reports, which picks its icon and log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    /// Startup report or state change.
    Status,
    /// Something came back.
    Recovery,
    /// Something is down or failing.
    Failure,
    /// Incoming payment.
    Payment,
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertKind::Status => write!(f, "STATUS"),
            AlertKind::Recovery => write!(f, "RECOVERY"),
            AlertKind::Failure => write!(f, "FAILURE"),
            AlertKind::Payment => write!(f, "PAYMENT"),
        }
    }
}

impl AlertKind {
    /// Get emoji for kind.
    pub fn emoji(&self) -> &'static str {
        match self {
            AlertKind::Status => "\u{1f514}",
            AlertKind::Recovery => "\u{2705}",
            AlertKind::Failure => "\u{1f6a8}",
            AlertKind::Payment => "\u{1f4b0}",
        }
    }
}

/// An alert message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    /// Alert kind.
    pub kind: AlertKind,
    /// Alert title, rendered bold.
    pub title: String,
    /// Markdown body lines, may be empty.
    pub body: String,
    /// Local wall-clock creation time.
    pub timestamp: DateTime<Local>,
    /// Monitoring domain that raised the alert.
    pub source: Option<String>,
}

impl Alert {
    /// Create a new alert stamped with the current local time.
    pub fn new(kind: AlertKind, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            body: body.into(),
            timestamp: Local::now(),
            source: None,
        }
    }

    /// Set source.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Override the timestamp.
    pub fn with_timestamp(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Format for log output.
    pub fn format_text(&self) -> String {
        let mut text = format!(
            "[{}] {} - {}",
            self.kind,
            self.timestamp.format(TIME_FORMAT),
            self.title
        );

        if !self.body.is_empty() {
            text.push('\n');
            text.push_str(self.body.trim_end_matches('\n'));
        }

        if let Some(ref source) = self.source {
            text.push_str(&format!("\nSource: {}", source));
        }

        text
    }

    /// Format for Telegram legacy Markdown (`*bold*`, `` `code` ``).
    ///
    /// A body ending in a newline leaves a blank line before `Time:`.
    pub fn format_markdown(&self) -> String {
        let mut text = format!("{} *{}*\n", self.kind.emoji(), self.title);

        if !self.body.is_empty() {
            text.push_str(&self.body);
            text.push('\n');
        }

        text.push_str(&format!("Time: `{}`", self.timestamp.format(TIME_FORMAT)));
        text
    }
}

/// Wrap text in a fenced block for fixed-width display.
pub fn code_block(text: &str) -> String {
    format!("```\n{}\n```", text)
}

/// Render an optional value for a code span.
pub fn display_value(value: Option<&str>) -> &str {
    value.unwrap_or("none")
}

/// Alert channel trait.
#[async_trait]
pub trait AlertChannel: Send + Sync {
    /// Channel name.
    fn name(&self) -> &str;

    /// Send an alert.
    async fn send(&self, alert: &Alert) -> Result<(), MonitorError>;
}

/// Log channel (writes to tracing).
pub struct LogChannel;

#[async_trait]
impl AlertChannel for LogChannel {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, alert: &Alert) -> Result<(), MonitorError> {
        match alert.kind {
            AlertKind::Status | AlertKind::Recovery | AlertKind::Payment => {
                info!("[ALERT] {}: {}", alert.title, alert.body)
            }
            AlertKind::Failure => error!("[ALERT] {}: {}", alert.title, alert.body),
        }
        Ok(())
    }
}
