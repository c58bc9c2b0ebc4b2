//! BTCPay Server health endpoint evaluation.

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;

use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use tracing::error;
use url::Url;

use hostwatch_config::{ConfigValidator, HealthConfig};

use crate::alerts::{Alert, AlertKind};
use crate::error::MonitorError;

/// Health path, relative to the normalised base URL.
pub const HEALTH_PATH: &str = "api/v1/health";

const STATUS_EXCERPT_CHARS: usize = 256;
const INVALID_BODY_EXCERPT_CHARS: usize = 500;

/// Result of one health evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum HealthOutcome {
    /// Reachable and synchronized.
    Healthy,
    /// Request never produced a response.
    ConnectionFailed(String),
    /// Non-success status code.
    BadStatus { status: u16, excerpt: String },
    /// Success status but the body is not JSON.
    InvalidBody { excerpt: String },
    /// JSON body without `synchronized: true`.
    NotSynchronized { body: serde_json::Value },
}

impl HealthOutcome {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthOutcome::Healthy)
    }

    /// Alert to send; every unhealthy outcome produces one.
    pub fn to_alert(&self) -> Option<Alert> {
        let (title, body) = match self {
            HealthOutcome::Healthy => return None,
            HealthOutcome::ConnectionFailed(detail) => (
                "ALERT: BTCPay Server Health Check Failed",
                format!("Connection Error: `{}`", detail),
            ),
            HealthOutcome::BadStatus { status, excerpt } => (
                "ALERT: BTCPay Server Health Check Failed",
                format!("Status Code: `{}`\nResponse: `{}`", status, excerpt),
            ),
            HealthOutcome::InvalidBody { excerpt } => (
                "ALERT: BTCPay Server Health Check Failed",
                format!("Response not valid JSON\nResponse: `{}`", excerpt),
            ),
            HealthOutcome::NotSynchronized { body } => (
                "ALERT: BTCPay Server Not Synchronized",
                format!(
                    "Health Status: `{}`",
                    serde_json::to_string_pretty(body).unwrap_or_else(|_| body.to_string())
                ),
            ),
        };
        Some(Alert::new(AlertKind::Failure, title, body).with_source("health"))
    }
}

/// Evaluate a received response.
pub fn evaluate_response(status: u16, body: &str) -> HealthOutcome {
    if !(200..300).contains(&status) {
        return HealthOutcome::BadStatus {
            status,
            excerpt: truncate_chars(body, STATUS_EXCERPT_CHARS),
        };
    }

    let parsed: serde_json::Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) => {
            return HealthOutcome::InvalidBody {
                excerpt: truncate_chars(body, INVALID_BODY_EXCERPT_CHARS),
            };
        }
    };

    match parsed.get("synchronized").and_then(serde_json::Value::as_bool) {
        Some(true) => HealthOutcome::Healthy,
        _ => HealthOutcome::NotSynchronized { body: parsed },
    }
}

/// First `max` characters of `text`, never splitting a character.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((index, _)) => text[..index].to_string(),
        None => text.to_string(),
    }
}

/// Health URL for a base URL, adding the trailing `/` when missing.
pub fn health_url(base: &Url) -> Result<Url, MonitorError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(HEALTH_PATH)
        .map_err(|e| MonitorError::InvalidConfig(format!("health URL: {}", e)))
}

/// Polls the health endpoint once per call.
pub struct HealthEvaluator {
    client: reqwest::Client,
    url: Url,
    api_key: Option<String>,
}

impl HealthEvaluator {
    pub fn new(
        base_url: &str,
        api_key: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, MonitorError> {
        let base = ConfigValidator::parse_base_url(base_url)
            .map_err(|reason| MonitorError::InvalidConfig(format!("health.base_url: {}", reason)))?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: health_url(&base)?,
            api_key: api_key.map(str::to_string),
        })
    }

    /// Build from config. `Ok(None)` when no base URL is configured.
    pub fn from_config(config: &HealthConfig) -> Result<Option<Self>, MonitorError> {
        match config.base_url() {
            Some(base_url) => Self::new(base_url, config.api_key(), config.timeout()).map(Some),
            None => Ok(None),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub async fn evaluate(&self) -> HealthOutcome {
        let mut request = self.client.get(self.url.clone());
        if let Some(ref key) = self.api_key {
            request = request.header(AUTHORIZATION, format!("token {}", key));
        }

        let outcome = match request.send().await {
            Err(e) => HealthOutcome::ConnectionFailed(e.to_string()),
            Ok(response) => {
                let status = response.status().as_u16();
                match response.text().await {
                    Ok(body) => evaluate_response(status, &body),
                    Err(e) => HealthOutcome::ConnectionFailed(e.to_string()),
                }
            }
        };

        match &outcome {
            HealthOutcome::Healthy => {}
            HealthOutcome::ConnectionFailed(detail) => {
                error!("Error connecting to BTCPay health endpoint: {}", detail)
            }
            HealthOutcome::BadStatus { status, .. } => {
                error!("BTCPay health check failed: Status {}", status)
            }
            HealthOutcome::InvalidBody { excerpt } => {
                error!("BTCPay health check returned non-JSON response: {}", excerpt)
            }
            HealthOutcome::NotSynchronized { body } => {
                error!("BTCPay server not synchronized: {}", body)
            }
        }

        outcome
    }
}
