//! Mullvad VPN tunnel monitoring: status parsing, snapshot diffing and the
//! `mullvad status` probe.

#[cfg(test)]
#[path = "vpn_tests.rs"]
mod tests;

use std::sync::Arc;

use tracing::debug;

use crate::alerts::{Alert, AlertKind, display_value};
use crate::command::CommandRunner;
use crate::error::MonitorError;

const CONNECTED_MARKER: &str = "Connected to";
const LOCATION_SEPARATOR: &str = " in ";
const IPV4_MARKER: &str = "IPv4: ";
const IPV6_MARKER: &str = "IPv6: ";

/// Tunnel details observed while connected. Any field may be missing when
/// the status output only partially matched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VpnConnection {
    /// Relay hostname, e.g. `us-lax-wg-101`.
    pub endpoint: Option<String>,
    /// Relay location, e.g. `Los Angeles, CA, USA`.
    pub location: Option<String>,
    pub ipv4: Option<String>,
    pub ipv6: Option<String>,
}

impl VpnConnection {
    pub fn field(&self, field: VpnField) -> Option<&str> {
        match field {
            VpnField::Endpoint => self.endpoint.as_deref(),
            VpnField::Location => self.location.as_deref(),
            VpnField::Ipv4 => self.ipv4.as_deref(),
            VpnField::Ipv6 => self.ipv6.as_deref(),
        }
    }
}

/// Tunnel state at one sampling instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VpnSnapshot {
    Disconnected,
    Connected(VpnConnection),
}

impl VpnSnapshot {
    pub fn is_connected(&self) -> bool {
        matches!(self, VpnSnapshot::Connected(_))
    }

    pub fn connection(&self) -> Option<&VpnConnection> {
        match self {
            VpnSnapshot::Connected(connection) => Some(connection),
            VpnSnapshot::Disconnected => None,
        }
    }
}

/// Comparable fields of a connected snapshot, in comparison order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VpnField {
    Endpoint,
    Location,
    Ipv4,
    Ipv6,
}

impl VpnField {
    pub const ALL: [VpnField; 4] = [
        VpnField::Endpoint,
        VpnField::Location,
        VpnField::Ipv4,
        VpnField::Ipv6,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            VpnField::Endpoint => "Endpoint",
            VpnField::Location => "Location",
            VpnField::Ipv4 => "IPv4",
            VpnField::Ipv6 => "IPv6",
        }
    }

    fn emoji(&self) -> &'static str {
        match self {
            VpnField::Endpoint => "\u{1f504}",
            VpnField::Location => "\u{1f4cd}",
            VpnField::Ipv4 | VpnField::Ipv6 => "\u{1f310}",
        }
    }
}

/// One difference between two consecutive snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VpnChange {
    Connected,
    Disconnected,
    FieldChanged {
        field: VpnField,
        old: Option<String>,
        new: Option<String>,
    },
}

impl std::fmt::Display for VpnChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VpnChange::Connected => write!(f, "VPN Connected"),
            VpnChange::Disconnected => write!(f, "VPN Disconnected"),
            VpnChange::FieldChanged { field, old, new } => write!(
                f,
                "{} changed: {} \u{2192} {}",
                field.label(),
                display_value(old.as_deref()),
                display_value(new.as_deref())
            ),
        }
    }
}

impl VpnChange {
    /// Markdown line used inside a change alert.
    pub fn to_markdown(&self) -> String {
        match self {
            VpnChange::Connected => "\u{1f7e2} VPN *Connected*".to_string(),
            VpnChange::Disconnected => "\u{1f534} VPN *Disconnected*".to_string(),
            VpnChange::FieldChanged { field, old, new } => format!(
                "{} {} changed: `{}` \u{2192} `{}`",
                field.emoji(),
                field.label(),
                display_value(old.as_deref()),
                display_value(new.as_deref())
            ),
        }
    }
}

/// Compare two snapshots.
///
/// A connectivity flip is reported alone. Field changes are only looked for
/// when both sides are connected.
pub fn diff(previous: &VpnSnapshot, current: &VpnSnapshot) -> Vec<VpnChange> {
    match (previous, current) {
        (VpnSnapshot::Disconnected, VpnSnapshot::Connected(_)) => vec![VpnChange::Connected],
        (VpnSnapshot::Connected(_), VpnSnapshot::Disconnected) => vec![VpnChange::Disconnected],
        (VpnSnapshot::Disconnected, VpnSnapshot::Disconnected) => Vec::new(),
        (VpnSnapshot::Connected(old), VpnSnapshot::Connected(new)) => VpnField::ALL
            .iter()
            .filter(|field| old.field(**field) != new.field(**field))
            .map(|field| VpnChange::FieldChanged {
                field: *field,
                old: old.field(*field).map(str::to_string),
                new: new.field(*field).map(str::to_string),
            })
            .collect(),
    }
}

/// Result of parsing `mullvad status` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOutcome {
    pub snapshot: VpnSnapshot,
    /// Fields left unset because their marker was not found. Always empty
    /// for a disconnected snapshot.
    pub missing: Vec<VpnField>,
}

impl ParseOutcome {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Parse the two-line status text.
///
/// ```text
/// Connected to us-lax-wg-101 in Los Angeles, CA, USA
/// Your connection appears to be from: USA, Los Angeles, CA. IPv4: 1.2.3.4, IPv6: 2001:db8::1
/// ```
///
/// Anything not starting with `Connected to` is disconnected. Unmatched
/// markers leave their field unset; this never fails.
pub fn parse_status(output: &str) -> ParseOutcome {
    let output = output.trim();
    if !output.starts_with(CONNECTED_MARKER) {
        return ParseOutcome {
            snapshot: VpnSnapshot::Disconnected,
            missing: Vec::new(),
        };
    }

    let mut lines = output.lines();
    let mut connection = VpnConnection::default();

    if let Some(first) = lines.next() {
        let parts: Vec<&str> = first.split(LOCATION_SEPARATOR).collect();
        if let [relay, location] = parts.as_slice() {
            connection.endpoint = non_empty(relay.replace("Connected to ", ""));
            connection.location = non_empty(location.to_string());
        }
    }

    if let Some(second) = lines.next() {
        connection.ipv4 = second
            .split(IPV4_MARKER)
            .nth(1)
            .and_then(|rest| rest.split(',').next())
            .and_then(|ip| non_empty(ip.trim().to_string()));
        connection.ipv6 = second
            .split(IPV6_MARKER)
            .nth(1)
            .and_then(|ip| non_empty(ip.trim().to_string()));
    }

    let missing = VpnField::ALL
        .iter()
        .copied()
        .filter(|field| connection.field(*field).is_none())
        .collect();

    ParseOutcome {
        snapshot: VpnSnapshot::Connected(connection),
        missing,
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Startup report describing the current tunnel state.
pub fn status_report(snapshot: &VpnSnapshot) -> Alert {
    let body = match snapshot {
        VpnSnapshot::Disconnected => "Status: *Disconnected*".to_string(),
        VpnSnapshot::Connected(connection) => {
            let mut lines = vec![
                "Status: *Connected*".to_string(),
                format!("Endpoint: `{}`", display_value(connection.endpoint.as_deref())),
                format!("Location: `{}`", display_value(connection.location.as_deref())),
                format!("IPv4: `{}`", display_value(connection.ipv4.as_deref())),
            ];
            if let Some(ref ipv6) = connection.ipv6 {
                lines.push(format!("IPv6: `{}`", ipv6));
            }
            lines.join("\n")
        }
    };

    Alert::new(AlertKind::Status, "Mullvad VPN Monitoring Started", body).with_source("vpn")
}

/// One alert listing every change, or nothing when there are none.
/// The change lines are set off from the timestamp by a blank line.
pub fn change_alert(changes: &[VpnChange]) -> Option<Alert> {
    if changes.is_empty() {
        return None;
    }
    let mut body = changes
        .iter()
        .map(VpnChange::to_markdown)
        .collect::<Vec<_>>()
        .join("\n");
    body.push('\n');
    Some(Alert::new(AlertKind::Status, "Mullvad VPN Status Change", body).with_source("vpn"))
}

/// Samples tunnel state through the VPN client CLI.
pub struct VpnProbe {
    runner: Arc<dyn CommandRunner>,
    command: String,
}

impl VpnProbe {
    pub fn new(runner: Arc<dyn CommandRunner>, command: impl Into<String>) -> Self {
        Self {
            runner,
            command: command.into(),
        }
    }

    /// Run `<command> status` and parse it. A nonzero exit is a probe failure.
    pub async fn probe(&self) -> Result<VpnSnapshot, MonitorError> {
        let output = self
            .runner
            .run(&self.command, &["status".to_string()])
            .await?;

        if !output.is_success() {
            return Err(MonitorError::probe(
                "vpn",
                format!(
                    "'{} status' exited with {:?}: {}",
                    self.command,
                    output.code,
                    output.stderr.trim()
                ),
            ));
        }

        let parsed = parse_status(&output.stdout);
        if !parsed.is_complete() {
            debug!(
                "Partial VPN status parse, missing {:?}: {}",
                parsed.missing,
                output.stdout.trim()
            );
        }
        Ok(parsed.snapshot)
    }
}
