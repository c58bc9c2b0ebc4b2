use super::*;
use crate::command::CommandOutput;
use crate::testing::ScriptedRunner;
use chrono::{Local, TimeZone};

const FULL_STATUS: &str = "Connected to us-lax-wg-101 in Los Angeles, CA, USA\n\
Your connection appears to be from: USA, Los Angeles, CA. IPv4: 1.2.3.4, IPv6: 2001:db8::1\n";

fn connected(endpoint: &str, location: &str, ipv4: &str, ipv6: Option<&str>) -> VpnSnapshot {
    VpnSnapshot::Connected(VpnConnection {
        endpoint: Some(endpoint.to_string()),
        location: Some(location.to_string()),
        ipv4: Some(ipv4.to_string()),
        ipv6: ipv6.map(str::to_string),
    })
}

#[test]
fn test_parse_full_status() {
    let parsed = parse_status(FULL_STATUS);
    assert!(parsed.is_complete());
    assert_eq!(
        parsed.snapshot,
        connected(
            "us-lax-wg-101",
            "Los Angeles, CA, USA",
            "1.2.3.4",
            Some("2001:db8::1")
        )
    );
}

#[test]
fn test_parse_without_ipv6_marker() {
    let output = "Connected to se-got-wg-004 in Gothenburg, Sweden\n\
Your connection appears to be from: Sweden, Gothenburg. IPv4: 185.213.154.1";
    let parsed = parse_status(output);
    assert_eq!(parsed.missing, vec![VpnField::Ipv6]);
    let connection = parsed.snapshot.connection().unwrap();
    assert_eq!(connection.endpoint.as_deref(), Some("se-got-wg-004"));
    assert_eq!(connection.location.as_deref(), Some("Gothenburg, Sweden"));
    assert_eq!(connection.ipv4.as_deref(), Some("185.213.154.1"));
    assert!(connection.ipv6.is_none());
}

#[test]
fn test_parse_single_line_connected() {
    let parsed = parse_status("Connected to us-lax-wg-101 in Los Angeles, CA, USA");
    let connection = parsed.snapshot.connection().unwrap();
    assert_eq!(connection.endpoint.as_deref(), Some("us-lax-wg-101"));
    assert!(connection.ipv4.is_none());
    assert_eq!(parsed.missing, vec![VpnField::Ipv4, VpnField::Ipv6]);
}

#[test]
fn test_parse_without_location_separator() {
    let parsed = parse_status("Connected to us-lax-wg-101\nIPv4: 1.2.3.4");
    let connection = parsed.snapshot.connection().unwrap();
    assert!(connection.endpoint.is_none());
    assert!(connection.location.is_none());
    assert_eq!(connection.ipv4.as_deref(), Some("1.2.3.4"));
}

#[test]
fn test_parse_ambiguous_separator_leaves_fields_unset() {
    let parsed = parse_status("Connected to relay in Springfield in Oregon");
    let connection = parsed.snapshot.connection().unwrap();
    assert!(connection.endpoint.is_none());
    assert!(connection.location.is_none());
}

#[test]
fn test_parse_disconnected() {
    for output in ["Disconnected", "Disconnected\n", "", "Connecting to us-lax-wg-101..."] {
        let parsed = parse_status(output);
        assert_eq!(parsed.snapshot, VpnSnapshot::Disconnected, "output: {output:?}");
        assert!(parsed.missing.is_empty());
    }
}

#[test]
fn test_parse_empty_marker_value_is_unset() {
    let parsed = parse_status("Connected to a in b\nIPv4: , IPv6: ");
    let connection = parsed.snapshot.connection().unwrap();
    assert!(connection.ipv4.is_none());
    assert!(connection.ipv6.is_none());
}

#[test]
fn test_diff_identical_connected_is_empty() {
    let a = connected("us-lax-wg-101", "Los Angeles, CA, USA", "1.2.3.4", None);
    assert!(diff(&a, &a.clone()).is_empty());
}

#[test]
fn test_diff_both_disconnected_is_empty() {
    assert!(diff(&VpnSnapshot::Disconnected, &VpnSnapshot::Disconnected).is_empty());
}

#[test]
fn test_diff_connectivity_flip_is_single_change() {
    let up = connected("us-lax-wg-101", "Los Angeles, CA, USA", "1.2.3.4", None);

    assert_eq!(diff(&VpnSnapshot::Disconnected, &up), vec![VpnChange::Connected]);
    assert_eq!(diff(&up, &VpnSnapshot::Disconnected), vec![VpnChange::Disconnected]);

    let partial = VpnSnapshot::Connected(VpnConnection::default());
    assert_eq!(diff(&VpnSnapshot::Disconnected, &partial).len(), 1);
}

#[test]
fn test_diff_endpoint_change() {
    let previous = connected("us-lax-wg-101", "Los Angeles, CA, USA", "1.2.3.4", None);
    let current = connected("us-nyc-wg-205", "Los Angeles, CA, USA", "1.2.3.4", None);

    let changes = diff(&previous, &current);
    assert_eq!(changes.len(), 1);
    assert_eq!(
        changes[0],
        VpnChange::FieldChanged {
            field: VpnField::Endpoint,
            old: Some("us-lax-wg-101".to_string()),
            new: Some("us-nyc-wg-205".to_string()),
        }
    );
    assert!(changes[0].to_string().contains("us-lax-wg-101 \u{2192} us-nyc-wg-205"));
}

#[test]
fn test_diff_reports_fields_in_order() {
    let previous = connected("a", "Here", "1.1.1.1", Some("::1"));
    let current = connected("b", "There", "2.2.2.2", None);

    let fields: Vec<VpnField> = diff(&previous, &current)
        .into_iter()
        .map(|change| match change {
            VpnChange::FieldChanged { field, .. } => field,
            other => panic!("unexpected change {other:?}"),
        })
        .collect();
    assert_eq!(fields, VpnField::ALL.to_vec());
}

#[test]
fn test_diff_presence_change_counts() {
    let previous = connected("a", "Here", "1.1.1.1", None);
    let current = connected("a", "Here", "1.1.1.1", Some("2001:db8::1"));

    let changes = diff(&previous, &current);
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].to_string(), "IPv6 changed: none \u{2192} 2001:db8::1");
}

#[test]
fn test_change_markdown() {
    let change = VpnChange::FieldChanged {
        field: VpnField::Location,
        old: Some("Here".to_string()),
        new: Some("There".to_string()),
    };
    assert_eq!(
        change.to_markdown(),
        "\u{1f4cd} Location changed: `Here` \u{2192} `There`"
    );
    assert_eq!(VpnChange::Disconnected.to_markdown(), "\u{1f534} VPN *Disconnected*");
}

#[test]
fn test_status_report_connected() {
    let alert = status_report(&parse_status(FULL_STATUS).snapshot);
    assert_eq!(alert.title, "Mullvad VPN Monitoring Started");
    assert!(alert.body.contains("Status: *Connected*"));
    assert!(alert.body.contains("Endpoint: `us-lax-wg-101`"));
    assert!(alert.body.contains("IPv6: `2001:db8::1`"));
}

#[test]
fn test_status_report_disconnected() {
    let alert = status_report(&VpnSnapshot::Disconnected);
    assert_eq!(alert.body, "Status: *Disconnected*");
}

#[test]
fn test_change_alert() {
    assert!(change_alert(&[]).is_none());

    let alert = change_alert(&[VpnChange::Connected]).unwrap();
    assert_eq!(alert.title, "Mullvad VPN Status Change");
    assert_eq!(alert.body, "\u{1f7e2} VPN *Connected*\n");
}

#[test]
fn test_change_alert_leaves_blank_line_before_time() {
    let time = Local.with_ymd_and_hms(2026, 10, 18, 9, 5, 7).unwrap();
    let alert = change_alert(&[VpnChange::Connected, VpnChange::Disconnected])
        .unwrap()
        .with_timestamp(time);

    assert_eq!(
        alert.format_markdown(),
        "\u{1f514} *Mullvad VPN Status Change*\n\u{1f7e2} VPN *Connected*\n\u{1f534} VPN *Disconnected*\n\nTime: `2026-10-18 09:05:07`"
    );

    let report = status_report(&VpnSnapshot::Disconnected).with_timestamp(time);
    assert!(report.format_markdown().ends_with("*Disconnected*\nTime: `2026-10-18 09:05:07`"));
}

#[tokio::test]
async fn test_probe_parses_output() {
    let runner = ScriptedRunner::new();
    runner.push_output("mullvad status", CommandOutput::success(FULL_STATUS));

    let probe = VpnProbe::new(Arc::new(runner.clone()), "mullvad");
    let snapshot = probe.probe().await.unwrap();
    assert!(snapshot.is_connected());
    assert_eq!(runner.calls(), vec!["mullvad status"]);
}

#[tokio::test]
async fn test_probe_nonzero_exit_fails() {
    let runner = ScriptedRunner::new();
    runner.push_output(
        "mullvad status",
        CommandOutput::failure(1, "", "Error: Management daemon is not running"),
    );

    let probe = VpnProbe::new(Arc::new(runner), "mullvad");
    let err = probe.probe().await.unwrap_err();
    assert!(matches!(err, MonitorError::ProbeFailed { domain: "vpn", .. }));
    assert!(err.to_string().contains("Management daemon is not running"));
}
