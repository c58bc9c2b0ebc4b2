//! Lightning payment detection from the node's journal.
//!
//! Each tick asks journald for log lines matching an inbound-only settlement
//! within a trailing window. Nothing is remembered between ticks.

#[cfg(test)]
#[path = "payments_tests.rs"]
mod tests;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use tracing::{error, info};

use hostwatch_config::PaymentsConfig;

use crate::alerts::{Alert, AlertKind, TIME_FORMAT, code_block};
use crate::command::{CommandOutput, CommandRunner};
use crate::error::MonitorError;

/// journalctl's stdout when the query matched nothing.
pub const NO_ENTRIES_SENTINEL: &str = "-- No entries --";

/// Result of one payment query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// No matching lines in the window.
    NoEntries,
    /// Matching lines, verbatim.
    Received(String),
    /// The query ran and failed; carries its diagnostic output.
    QueryFailed(String),
    /// The query could not be run at all.
    InvocationFailed(String),
}

impl PaymentOutcome {
    /// Alert to send, if any. An invocation failure carries no payload.
    pub fn to_alert(&self) -> Option<Alert> {
        let alert = match self {
            PaymentOutcome::NoEntries => return None,
            PaymentOutcome::Received(text) => Alert::new(
                AlertKind::Payment,
                "LND Payment Received",
                code_block(text),
            ),
            PaymentOutcome::QueryFailed(diagnostic) => Alert::new(
                AlertKind::Failure,
                "ALERT: LND payment check failed",
                code_block(diagnostic),
            ),
            PaymentOutcome::InvocationFailed(_) => {
                Alert::new(AlertKind::Failure, "ALERT: LND payment check failed", "")
            }
        };
        Some(alert.with_source("payments"))
    }
}

/// Classify a finished query.
///
/// A nonzero exit only counts as failed when it printed a diagnostic;
/// otherwise stdout is inspected as usual.
pub fn classify(output: &CommandOutput) -> PaymentOutcome {
    let stderr = output.stderr.trim();
    if !output.is_success() && !stderr.is_empty() {
        return PaymentOutcome::QueryFailed(stderr.to_string());
    }

    let stdout = output.stdout.trim();
    if stdout.is_empty() || stdout == NO_ENTRIES_SENTINEL {
        PaymentOutcome::NoEntries
    } else {
        PaymentOutcome::Received(stdout.to_string())
    }
}

/// Queries the journal for inbound payments.
pub struct PaymentDetector {
    runner: Arc<dyn CommandRunner>,
    command: String,
    unit: String,
    pattern: String,
    lookback: Duration,
}

impl PaymentDetector {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        unit: impl Into<String>,
        pattern: impl Into<String>,
        lookback: Duration,
    ) -> Self {
        Self {
            runner,
            command: "journalctl".to_string(),
            unit: unit.into(),
            pattern: pattern.into(),
            lookback,
        }
    }

    pub fn from_config(runner: Arc<dyn CommandRunner>, config: &PaymentsConfig) -> Self {
        Self::new(runner, &config.unit, &config.pattern, config.lookback())
    }

    /// Arguments for a query whose window ends at `now`.
    ///
    /// Fails when the window start is not a representable time.
    pub fn query_args(&self, now: DateTime<Local>) -> Result<Vec<String>, MonitorError> {
        let since = chrono::Duration::from_std(self.lookback)
            .ok()
            .and_then(|lookback| now.checked_sub_signed(lookback))
            .ok_or_else(|| {
                MonitorError::InvalidConfig(format!(
                    "payments lookback of {}s is out of range",
                    self.lookback.as_secs()
                ))
            })?;
        Ok(vec![
            "-u".to_string(),
            self.unit.clone(),
            "-r".to_string(),
            "--grep".to_string(),
            self.pattern.clone(),
            "--since".to_string(),
            since.format(TIME_FORMAT).to_string(),
        ])
    }

    /// Run the query for the window ending now.
    pub async fn detect(&self) -> PaymentOutcome {
        let outcome = match self.query_args(Local::now()) {
            Err(e) => PaymentOutcome::InvocationFailed(e.to_string()),
            Ok(args) => match self.runner.run(&self.command, &args).await {
                Ok(output) => classify(&output),
                Err(e) => PaymentOutcome::InvocationFailed(e.to_string()),
            },
        };

        match &outcome {
            PaymentOutcome::NoEntries => {}
            PaymentOutcome::Received(text) => info!("LND payment received: {}", text),
            PaymentOutcome::QueryFailed(diagnostic) => {
                error!("Error checking LND payments: {}", diagnostic)
            }
            PaymentOutcome::InvocationFailed(reason) => {
                error!("Could not query LND payments: {}", reason)
            }
        }

        outcome
    }
}
