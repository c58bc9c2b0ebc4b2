//! Monitor errors.

use thiserror::Error;

/// Monitor error types.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// External command could not be started or awaited.
    #[error("Failed to run {program}: {source}")]
    Command {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// External command exceeded its time budget.
    #[error("{program} did not finish within {secs}s")]
    CommandTimeout { program: String, secs: u64 },

    /// Probe ran but produced no usable observation.
    #[error("{domain} probe failed: {details}")]
    ProbeFailed {
        domain: &'static str,
        details: String,
    },

    /// Alert delivery failed.
    #[error("Alert delivery failed: {0}")]
    AlertDelivery(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl MonitorError {
    /// Convenience constructor for probe failures.
    pub fn probe(domain: &'static str, details: impl Into<String>) -> Self {
        Self::ProbeFailed {
            domain,
            details: details.into(),
        }
    }
}
