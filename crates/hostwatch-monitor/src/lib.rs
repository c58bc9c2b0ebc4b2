//! # Hostwatch Monitor
//!
//! Polling host monitor core: probe adapters, state-diff engines, alert
//! delivery and the cooperative poll loop.
//!
//! ## Domains
//!
//! - Mullvad VPN tunnel status (`mullvad status`)
//! - systemd unit liveness (`systemctl is-active`)
//! - Lightning payment log (`journalctl --grep`)
//! - BTCPay Server health endpoint (`/api/v1/health`)

pub mod alert_channels;
pub mod alert_manager;
pub mod alerts;
pub mod command;
pub mod error;
pub mod health;
pub mod payments;
pub mod scheduler;
pub mod services;
pub mod vpn;

#[cfg(test)]
pub(crate) mod testing;

pub use alert_channels::TelegramChannel;
pub use alert_manager::AlertManager;
pub use alerts::{Alert, AlertChannel, AlertKind, LogChannel};
pub use command::{CommandOutput, CommandRunner, SystemCommandRunner};
pub use error::MonitorError;
pub use health::{HealthEvaluator, HealthOutcome};
pub use payments::{PaymentDetector, PaymentOutcome};
pub use scheduler::{Monitor, SchedulerState};
pub use services::{ServiceChange, ServiceProbe, ServiceSet, ServiceTransition};
pub use vpn::{VpnChange, VpnConnection, VpnField, VpnProbe, VpnSnapshot};
