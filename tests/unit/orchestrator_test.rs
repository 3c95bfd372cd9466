//! Tests for the scan orchestrator: end-to-end runs against an in-memory GitHub

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use stale_scan::adapters::github::GitHubClient;
use stale_scan::core::models::SkipReason;
use stale_scan::core::services::{Orchestrator, ScanState};
use stale_scan::error::{ExitStatus, ScanError};
use stale_scan::report::{CSV_FILE, HTML_FILE};
use tempfile::TempDir;

use crate::common::fake_github::{FakeGitHub, Reply};
use crate::common::fixtures::{ConfigBuilder, RepoBuilder, at, now};
use crate::common::mocks::{MockGitHub, bad_credentials, not_found};

/// Scenario A organization: X tagged APM0014540 with an 8-month-old branch,
/// Y untagged with a 1-month-old main
fn scenario_a() -> MockGitHub {
    MockGitHub::new()
        .with_repo(
            RepoBuilder::new(1, "X").topics(&["apm0014540"]).build(),
            &[("feature/old", at(2024, 10, 2))],
        )
        .with_repo(RepoBuilder::new(2, "Y").build(), &[("main", at(2025, 5, 20))])
}

#[tokio::test]
async fn scenario_a_reports_exactly_one_row() {
    let temp = TempDir::new().unwrap();
    let config = ConfigBuilder::new(temp.path()).itaps("APM0014540").months(6).build();
    let mut orchestrator = Orchestrator::new(config, Arc::new(scenario_a())).with_now(now());

    let outcome = orchestrator.run().await.unwrap();

    assert_eq!(outcome.exit, ExitStatus::Success);
    assert_eq!(orchestrator.state(), ScanState::Done);
    let csv = fs::read_to_string(temp.path().join(CSV_FILE)).unwrap();
    assert_eq!(
        csv,
        "repository,branch,itap_ids,last_activity_utc,age_months\n\
         X,feature/old,APM0014540,2024-10-02T12:00:00Z,8\n"
    );
    assert_eq!(outcome.report.metadata.repositories_scanned, 2);
    assert_eq!(outcome.report.metadata.repositories_out_of_scope, 1);
}

#[tokio::test]
async fn scenario_b_writes_metadata_only_html() {
    let temp = TempDir::new().unwrap();
    let mock = MockGitHub::new().with_repo(
        RepoBuilder::new(1, "X").topics(&["APM0014540"]).build(),
        &[("feature/new", at(2025, 3, 1))],
    );
    let config = ConfigBuilder::new(temp.path()).months(6).build();

    let outcome = Orchestrator::new(config, Arc::new(mock)).with_now(now()).run().await.unwrap();

    assert!(outcome.report.candidates.is_empty());
    assert!(outcome.files.csv.is_none());
    assert!(!temp.path().join(CSV_FILE).exists());
    let html = fs::read_to_string(temp.path().join(HTML_FILE)).unwrap();
    assert!(html.contains("acme"));
    assert!(html.contains("APM0014540"));
    assert!(html.contains("No branches met the staleness threshold"));
}

#[tokio::test]
async fn scenario_c_isolates_a_missing_repository() {
    let temp = TempDir::new().unwrap();
    let mock = MockGitHub::new()
        .with_repo(RepoBuilder::new(1, "gone-apm0014540").build(), &[])
        .fail_branches("gone-apm0014540", not_found("/repos/acme/gone-apm0014540/branches"))
        .with_repo(RepoBuilder::new(2, "live-apm0014540").build(), &[("old", at(2020, 1, 1))]);
    let config = ConfigBuilder::new(temp.path()).build();

    let outcome = Orchestrator::new(config, Arc::new(mock)).with_now(now()).run().await.unwrap();

    assert_eq!(outcome.exit, ExitStatus::Success);
    assert_eq!(outcome.report.metadata.skipped_count(), 1);
    assert_eq!(outcome.report.metadata.skipped[0].reason, SkipReason::NotFound);
    assert_eq!(outcome.report.candidates.len(), 1);
    assert_eq!(outcome.report.candidates[0].repository, "live-apm0014540");
    let html = fs::read_to_string(temp.path().join(HTML_FILE)).unwrap();
    assert!(html.contains("Repositories skipped: 1"));
    assert!(html.contains("not-found: 1"));
}

#[tokio::test]
async fn authentication_failure_everywhere_is_fatal() {
    let temp = TempDir::new().unwrap();
    let mock = MockGitHub::new()
        .with_repo(RepoBuilder::new(1, "a-apm0014540").build(), &[])
        .fail_properties("a-apm0014540", bad_credentials("/properties"))
        .with_repo(RepoBuilder::new(2, "b-apm0014540").build(), &[])
        .fail_properties("b-apm0014540", bad_credentials("/properties"));
    let config = ConfigBuilder::new(temp.path()).build();
    let mut orchestrator = Orchestrator::new(config, Arc::new(mock));

    let err = orchestrator.run().await.unwrap_err();

    assert!(matches!(err, ScanError::AuthenticationFailed(_)));
    assert_eq!(err.exit_status(), ExitStatus::Api);
    assert_eq!(orchestrator.state(), ScanState::Failed);
    assert!(!temp.path().join(HTML_FILE).exists());
}

#[tokio::test]
async fn listing_failure_is_fatal() {
    let temp = TempDir::new().unwrap();
    let mock = MockGitHub::new().fail_listing(not_found("/orgs/acme/repos"));
    let config = ConfigBuilder::new(temp.path()).build();

    let err = Orchestrator::new(config, Arc::new(mock)).run().await.unwrap_err();

    assert!(matches!(err, ScanError::OrganizationUnavailable { .. }));
    assert_eq!(err.exit_status(), ExitStatus::Api);
}

#[tokio::test]
async fn timeout_writes_partial_report_and_exits_3() {
    let temp = TempDir::new().unwrap();
    let mock = MockGitHub::new()
        .with_repo(RepoBuilder::new(1, "slow-apm0014540").build(), &[("old", at(2020, 1, 1))])
        .slow_branches(Duration::from_secs(30));
    let config = ConfigBuilder::new(temp.path()).timeout(Duration::from_millis(200)).build();

    let outcome = Orchestrator::new(config, Arc::new(mock)).with_now(now()).run().await.unwrap();

    assert_eq!(outcome.exit, ExitStatus::Timeout);
    assert!(outcome.report.metadata.timed_out);
    let html = fs::read_to_string(temp.path().join(HTML_FILE)).unwrap();
    assert!(html.contains("Partial report"));
}

#[tokio::test]
async fn invalid_config_fails_before_any_call() {
    let temp = TempDir::new().unwrap();
    let mut config = ConfigBuilder::new(temp.path()).build();
    config.concurrency = 0;
    let mock = Arc::new(scenario_a());

    let err = Orchestrator::new(config, Arc::clone(&mock)).run().await.unwrap_err();

    assert_eq!(err.exit_status(), ExitStatus::Validation);
    assert!(mock.calls().is_empty());
}

#[tokio::test]
async fn repeated_runs_produce_identical_csv() {
    let mut outputs = Vec::new();
    for _ in 0..2 {
        let temp = TempDir::new().unwrap();
        let mock = MockGitHub::new()
            .with_repo(
                RepoBuilder::new(2, "b-apm0014540").build(),
                &[("z", at(2020, 1, 1)), ("a", at(2021, 1, 1))],
            )
            .with_repo(RepoBuilder::new(1, "a-apm0014540").build(), &[("m", at(2022, 1, 1))]);
        let config = ConfigBuilder::new(temp.path()).concurrency(1).build();
        Orchestrator::new(config, Arc::new(mock)).with_now(now()).run().await.unwrap();
        outputs.push(fs::read(temp.path().join(CSV_FILE)).unwrap());
    }
    assert_eq!(outputs[0], outputs[1]);
    let csv = String::from_utf8(outputs.remove(0)).unwrap();
    let rows: Vec<&str> = csv.lines().skip(1).map(|l| l.split(',').nth(1).unwrap()).collect();
    assert_eq!(rows, vec!["m", "a", "z"]);
}

// =============================================================================
// Shared rate limit
// =============================================================================

const ALPHA_PROPERTIES: &str = "/repos/acme/alpha-apm0014540/properties/values";
const BETA_PROPERTIES: &str = "/repos/acme/beta-apm0014540/properties/values";
const BETA_BRANCHES: &str = "/repos/acme/beta-apm0014540/branches?per_page=100";

/// Two tagged repositories, each with one branch last touched in 2020
fn serve_two_tagged_repos(fake: &FakeGitHub) {
    fake.json(
        "/orgs/acme/repos?per_page=100&type=all",
        r#"[{"id": 1, "name": "alpha-apm0014540"}, {"id": 2, "name": "beta-apm0014540"}]"#,
    );
    for (repo, sha) in [("alpha-apm0014540", "a1"), ("beta-apm0014540", "b1")] {
        fake.json(
            &format!("/repos/acme/{repo}/branches?per_page=100"),
            &format!(r#"[{{"name": "stale", "commit": {{"sha": "{sha}"}}}}]"#),
        );
        fake.json(
            &format!("/repos/acme/{repo}/commits/{sha}"),
            r#"{"commit": {"author": {"name": "Ada", "date": "2020-01-01T00:00:00Z"}}}"#,
        );
    }
}

async fn scan_fake(fake: &FakeGitHub, out: &std::path::Path) -> String {
    let config = ConfigBuilder::new(out).api_url(fake.url()).concurrency(2).build();
    let client = GitHubClient::new(config.client.clone()).unwrap();
    let mut orchestrator = Orchestrator::new(config, Arc::new(client)).with_now(now());
    let outcome = orchestrator.run().await.unwrap();
    assert_eq!(outcome.exit, ExitStatus::Success);
    fs::read_to_string(out.join(CSV_FILE)).unwrap()
}

#[tokio::test]
async fn rate_limit_on_one_worker_holds_back_the_others() {
    let plain = FakeGitHub::start();
    serve_two_tagged_repos(&plain);
    let plain_out = TempDir::new().unwrap();
    let unthrottled = scan_fake(&plain, plain_out.path()).await;

    let throttled = FakeGitHub::start();
    serve_two_tagged_repos(&throttled);
    throttled.route(
        ALPHA_PROPERTIES,
        vec![
            Reply::status(429, "slow down").header("retry-after", "1"),
            Reply::status(404, r#"{"message": "Not Found"}"#),
        ],
    );
    // beta's first request is still in flight when alpha is told to back off
    throttled.route(
        BETA_PROPERTIES,
        vec![Reply::status(404, r#"{"message": "Not Found"}"#).delay(Duration::from_millis(300))],
    );
    let throttled_out = TempDir::new().unwrap();
    let csv = scan_fake(&throttled, throttled_out.path()).await;

    let limited_at = throttled.first_hit(ALPHA_PROPERTIES).unwrap();
    let beta_resumed_at = throttled.first_hit(BETA_BRANCHES).unwrap();
    assert!(
        beta_resumed_at.duration_since(limited_at) >= Duration::from_millis(900),
        "beta resumed {:?} after the rate limit",
        beta_resumed_at.duration_since(limited_at)
    );
    assert_eq!(throttled.hits(ALPHA_PROPERTIES), 2);
    assert_eq!(csv, unthrottled);
    assert_eq!(csv.lines().count(), 3);
}
