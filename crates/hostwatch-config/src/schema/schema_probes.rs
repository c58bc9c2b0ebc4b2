//! Per-domain probe configuration types (VPN, services, payments, health).

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::default_true;

/// Mullvad VPN monitoring configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VpnConfig {
    /// Whether VPN monitoring is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Status command, invoked as `<command> status`.
    #[serde(default = "default_vpn_command")]
    pub command: String,
}

impl Default for VpnConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            command: default_vpn_command(),
        }
    }
}

fn default_vpn_command() -> String {
    "mullvad".to_string()
}

/// systemd units to watch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServicesConfig {
    #[serde(default)]
    pub units: Vec<String>,
}

impl ServicesConfig {
    /// Configured unit names in order, without blanks or repeats.
    pub fn unique_units(&self) -> Vec<String> {
        let mut units: Vec<String> = Vec::with_capacity(self.units.len());
        for unit in &self.units {
            let unit = unit.trim();
            if !unit.is_empty() && !units.iter().any(|seen| seen == unit) {
                units.push(unit.to_string());
            }
        }
        units
    }
}

/// Payment log watch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentsConfig {
    /// Whether the payment log is queried each tick.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// journald unit the query is scoped to.
    #[serde(default = "default_payment_unit")]
    pub unit: String,

    /// Pattern passed to `journalctl --grep`.
    #[serde(default = "default_payment_pattern")]
    pub pattern: String,

    /// Trailing window, ending at query time.
    #[serde(default = "default_lookback")]
    pub lookback_secs: u64,
}

impl PaymentsConfig {
    pub fn lookback(&self) -> Duration {
        Duration::from_secs(self.lookback_secs)
    }
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            unit: default_payment_unit(),
            pattern: default_payment_pattern(),
            lookback_secs: default_lookback(),
        }
    }
}

fn default_payment_unit() -> String {
    "lnd".to_string()
}

fn default_payment_pattern() -> String {
    "Sent 0 satoshis and received [1-9][0-9]* satoshis".to_string()
}

fn default_lookback() -> u64 {
    90
}

/// BTCPay Server health endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Server base URL. Health checks are skipped when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Optional view API key, sent as `Authorization: token <key>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_health_timeout")]
    pub timeout_secs: u64,
}

impl HealthConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Base URL if set to something other than blank.
    pub fn base_url(&self) -> Option<&str> {
        self.base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// API key if set to something other than blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            timeout_secs: default_health_timeout(),
        }
    }
}

fn default_health_timeout() -> u64 {
    10
}
