//! systemd unit liveness tracking.

#[cfg(test)]
#[path = "services_tests.rs"]
mod tests;

use std::sync::Arc;

use crate::alerts::{Alert, AlertKind};
use crate::command::CommandRunner;
use crate::error::MonitorError;

/// Direction of a liveness flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceTransition {
    /// active -> inactive
    Down,
    /// inactive -> active
    Recovered,
}

/// A single unit's liveness flip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceChange {
    pub service: String,
    pub transition: ServiceTransition,
}

impl std::fmt::Display for ServiceChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.transition {
            ServiceTransition::Down => write!(f, "Service {} has stopped", self.service),
            ServiceTransition::Recovered => write!(f, "Service {} has started", self.service),
        }
    }
}

impl ServiceChange {
    pub fn to_alert(&self) -> Alert {
        let alert = match self.transition {
            ServiceTransition::Down => Alert::new(
                AlertKind::Failure,
                "ALERT: Service Down",
                format!("The `{}` service has *stopped*.", self.service),
            ),
            ServiceTransition::Recovered => Alert::new(
                AlertKind::Recovery,
                "Service Recovered",
                format!("The `{}` service is now *running*.", self.service),
            ),
        };
        alert.with_source("services")
    }
}

/// Compare one unit's previous and current liveness.
pub fn diff(service: &str, was_active: bool, is_active: bool) -> Option<ServiceChange> {
    let transition = match (was_active, is_active) {
        (true, false) => ServiceTransition::Down,
        (false, true) => ServiceTransition::Recovered,
        _ => return None,
    };
    Some(ServiceChange {
        service: service.to_string(),
        transition,
    })
}

/// Startup report for one unit.
pub fn startup_alert(service: &str, active: bool) -> Alert {
    Alert::new(
        AlertKind::Status,
        "Hostwatch Started",
        format!(
            "Monitoring systemd service: `{}`\nCurrent status: `{}`",
            service,
            if active { "active" } else { "inactive" }
        ),
    )
    .with_source("services")
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ServiceEntry {
    name: String,
    active: bool,
}

/// Liveness of every watched unit, in configuration order.
///
/// The key set is fixed once built; [`ServiceSet::record`] only updates
/// values of known units.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceSet {
    entries: Vec<ServiceEntry>,
}

impl ServiceSet {
    /// Build from `(name, active)` pairs. Later repeats of a name are ignored.
    pub fn new(initial: impl IntoIterator<Item = (String, bool)>) -> Self {
        let mut entries: Vec<ServiceEntry> = Vec::new();
        for (name, active) in initial {
            if !entries.iter().any(|entry| entry.name == name) {
                entries.push(ServiceEntry { name, active });
            }
        }
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.name.clone()).collect()
    }

    pub fn is_active(&self, service: &str) -> Option<bool> {
        self.entries
            .iter()
            .find(|entry| entry.name == service)
            .map(|entry| entry.active)
    }

    /// Store a fresh observation and return the transition it caused.
    /// Unknown units are ignored.
    pub fn record(&mut self, service: &str, is_active: bool) -> Option<ServiceChange> {
        let entry = self.entries.iter_mut().find(|entry| entry.name == service)?;
        let change = diff(service, entry.active, is_active);
        entry.active = is_active;
        change
    }
}

/// Queries unit liveness through the service manager CLI.
pub struct ServiceProbe {
    runner: Arc<dyn CommandRunner>,
    command: String,
}

impl ServiceProbe {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            command: "systemctl".to_string(),
        }
    }

    /// `systemctl is-active <unit>`; only the exact token `active` counts.
    ///
    /// The exit code is ignored because inactive units exit nonzero.
    pub async fn is_active(&self, service: &str) -> Result<bool, MonitorError> {
        let output = self
            .runner
            .run(
                &self.command,
                &["is-active".to_string(), service.to_string()],
            )
            .await?;
        Ok(output.stdout.trim() == "active")
    }
}
