use super::*;
use crate::testing::ScriptedRunner;
use chrono::TimeZone;

const PATTERN: &str = "Sent 0 satoshis and received [1-9][0-9]* satoshis";

fn detector(runner: &ScriptedRunner) -> PaymentDetector {
    PaymentDetector::new(
        Arc::new(runner.clone()),
        "lnd",
        PATTERN,
        Duration::from_secs(90),
    )
}

#[test]
fn test_classify_sentinel_is_silent() {
    let outcome = classify(&CommandOutput::success("-- No entries --\n"));
    assert_eq!(outcome, PaymentOutcome::NoEntries);
    assert!(outcome.to_alert().is_none());
}

#[test]
fn test_classify_empty_is_silent() {
    assert_eq!(classify(&CommandOutput::success("")), PaymentOutcome::NoEntries);
}

#[test]
fn test_classify_received_is_verbatim() {
    let line = "Oct 18 12:00:01 node lnd[812]: HSWC: Sent 0 satoshis and received 2500 satoshis";
    let outcome = classify(&CommandOutput::success(format!("{line}\n")));
    assert_eq!(outcome, PaymentOutcome::Received(line.to_string()));

    let alert = outcome.to_alert().unwrap();
    assert_eq!(alert.kind, AlertKind::Payment);
    assert_eq!(alert.title, "LND Payment Received");
    assert_eq!(alert.body, format!("```\n{line}\n```"));
}

#[test]
fn test_classify_query_failure_carries_diagnostic() {
    let outcome = classify(&CommandOutput::failure(
        1,
        "",
        "Failed to add filter for units: No data available",
    ));
    assert_eq!(
        outcome,
        PaymentOutcome::QueryFailed("Failed to add filter for units: No data available".to_string())
    );

    let alert = outcome.to_alert().unwrap();
    assert_eq!(alert.kind, AlertKind::Failure);
    assert!(alert.body.contains("No data available"));
}

#[test]
fn test_classify_nonzero_without_diagnostic_reads_stdout() {
    let outcome = classify(&CommandOutput::failure(1, "-- No entries --", ""));
    assert_eq!(outcome, PaymentOutcome::NoEntries);
}

#[test]
fn test_invocation_failure_alert_has_no_payload() {
    let alert = PaymentOutcome::InvocationFailed("No such file or directory".to_string())
        .to_alert()
        .unwrap();
    assert_eq!(alert.title, "ALERT: LND payment check failed");
    assert!(alert.body.is_empty());
}

#[test]
fn test_failure_alerts_are_distinguishable() {
    let query = PaymentOutcome::QueryFailed("boom".to_string()).to_alert().unwrap();
    let invoke = PaymentOutcome::InvocationFailed("boom".to_string())
        .to_alert()
        .unwrap();
    assert_ne!(query.format_markdown(), invoke.format_markdown());
}

#[test]
fn test_query_args_window() {
    let runner = ScriptedRunner::new();
    let now = Local.with_ymd_and_hms(2026, 10, 18, 12, 1, 30).unwrap();

    let args = detector(&runner).query_args(now).unwrap();
    assert_eq!(
        args,
        vec![
            "-u",
            "lnd",
            "-r",
            "--grep",
            PATTERN,
            "--since",
            "2026-10-18 12:00:00"
        ]
    );
}

#[tokio::test]
async fn test_detect_received() {
    let runner = ScriptedRunner::new();
    runner.push_prefix(
        "journalctl -u lnd -r --grep",
        Ok(CommandOutput::success("received 1000 satoshis")),
    );

    let outcome = detector(&runner).detect().await;
    assert_eq!(outcome, PaymentOutcome::Received("received 1000 satoshis".to_string()));
    assert_eq!(runner.calls().len(), 1);
}

#[tokio::test]
async fn test_detect_invocation_failure() {
    let runner = ScriptedRunner::new();
    runner.push_prefix(
        "journalctl",
        Err(MonitorError::Command {
            program: "journalctl".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        }),
    );

    let outcome = detector(&runner).detect().await;
    assert!(matches!(outcome, PaymentOutcome::InvocationFailed(_)));
}

#[test]
fn test_query_args_rejects_unrepresentable_window() {
    let runner = ScriptedRunner::new();
    let detector = PaymentDetector::new(
        Arc::new(runner.clone()),
        "lnd",
        PATTERN,
        Duration::from_secs(10_000_000_000_000),
    );

    let result = detector.query_args(Local::now());
    assert!(matches!(result, Err(MonitorError::InvalidConfig(_))));
}

#[tokio::test]
async fn test_detect_out_of_range_lookback_skips_query() {
    let runner = ScriptedRunner::new();
    let detector = PaymentDetector::new(
        Arc::new(runner.clone()),
        "lnd",
        PATTERN,
        Duration::from_secs(u64::MAX),
    );

    let outcome = detector.detect().await;
    assert!(matches!(outcome, PaymentOutcome::InvocationFailed(_)));
    assert!(outcome.to_alert().is_some());
    assert!(runner.calls().is_empty());
}
