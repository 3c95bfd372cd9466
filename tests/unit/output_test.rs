//! Tests for progress output
//!
//! Progress lines are part of the CI-facing contract: one line per event,
//! either `[LEVEL] event key=value ...` or a JSON object.

use stale_scan::output::{OutputMode, Progress};

#[test]
fn output_mode_default() {
    assert_eq!(OutputMode::default(), OutputMode::Human);
}

#[test]
fn human_lines_are_key_value() {
    let line = Progress::ScanStarted {
        org: "acme".to_string(),
        itaps: "APM0014540,APM0099999".to_string(),
        months: 6,
    }
    .line(OutputMode::Human);
    assert_eq!(line, "[INFO] scan_started org=acme itaps=APM0014540,APM0099999 months=6");
}

#[test]
fn skipped_repositories_are_warnings() {
    let line = Progress::RepositorySkipped {
        repository: "acme/gone".to_string(),
        reason: "not-found".to_string(),
        detail: "Not Found".to_string(),
    }
    .line(OutputMode::Human);
    assert!(line.starts_with("[WARN] repository_skipped"));
    assert!(line.contains("reason=not-found"));
    assert!(line.contains("detail=\"Not Found\""));
}

#[test]
fn json_lines_are_tagged_objects() {
    let line = Progress::ScanFinished {
        candidates: 1,
        scanned: 2,
        skipped: 0,
        out_of_scope: 1,
        api_errors: 0,
        elapsed_secs: 3,
    }
    .line(OutputMode::Json);
    let value: serde_json::Value = serde_json::from_str(&line).unwrap();
    assert_eq!(value["event"], "scan_finished");
    assert_eq!(value["candidates"], 1);
    assert_eq!(value["scanned"], 2);
    assert!(!line.contains('\n'));
}

#[test]
fn report_written_without_csv() {
    let progress = Progress::ReportWritten {
        html: "out/email.html".to_string(),
        csv: None,
    };
    assert_eq!(progress.line(OutputMode::Human), "[INFO] report_written html=out/email.html csv=none");
    let value: serde_json::Value = serde_json::from_str(&progress.line(OutputMode::Json)).unwrap();
    assert!(value["csv"].is_null());
}

#[test]
fn timeout_is_flagged_partial() {
    let line = Progress::TimedOut { after_secs: 1800 }.line(OutputMode::Human);
    assert_eq!(line, "[WARN] timed_out after_secs=1800 partial=true");
}
