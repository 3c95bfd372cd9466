//! Tests for CLI parsing and configuration resolution

use std::fs;
use std::time::Duration;

use clap::Parser;
use stale_scan::cli::Cli;
use stale_scan::config::{
    DEFAULT_API_URL, DEFAULT_CONCURRENCY, DEFAULT_TIMEOUT_SECS, Environment, ScanConfig, ScanSettings,
};
use stale_scan::error::ValidationError;
use stale_scan::output::OutputMode;
use tempfile::TempDir;

fn cli(extra: &[&str]) -> Cli {
    let mut args = vec![
        "stale-scan", "--org", "acme", "--itaps", "APM0014540", "--months", "6", "--out", "reports",
    ];
    args.extend_from_slice(extra);
    Cli::try_parse_from(args).unwrap()
}

fn env() -> Environment {
    Environment {
        token: Some("ghp_test".to_string()),
        api_url: None,
    }
}

// =============================================================================
// Defaults and validation
// =============================================================================

#[test]
fn defaults_apply_without_config_file() {
    let config = ScanConfig::resolve(&cli(&[]), &env()).unwrap();

    assert_eq!(config.org, "acme");
    assert_eq!(config.months, 6);
    assert_eq!(config.itaps.to_string(), "APM0014540");
    assert_eq!(config.client.api_url.as_str(), format!("{DEFAULT_API_URL}/"));
    assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
    assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    assert_eq!(config.client.itap_property.as_deref(), Some("itap"));
    assert!(!config.branch_policy.excludes_protected());
    assert_eq!(config.output, OutputMode::Human);
}

#[test]
fn missing_or_blank_token_is_rejected() {
    for token in [None, Some("   ".to_string())] {
        let env = Environment { token, api_url: None };
        assert!(matches!(
            ScanConfig::resolve(&cli(&[]), &env),
            Err(ValidationError::MissingToken("GITHUB_TOKEN"))
        ));
    }
}

#[test]
fn months_must_be_a_positive_integer() {
    for bad in ["0", "-1", "six", ""] {
        let cli = Cli::try_parse_from([
            "stale-scan", "--org", "acme", "--itaps", "APM0014540", "--months", bad, "--out", "r",
        ])
        .unwrap();
        assert!(
            matches!(ScanConfig::resolve(&cli, &env()), Err(ValidationError::InvalidMonths(_))),
            "{bad:?} accepted"
        );
    }
}

#[test]
fn empty_itap_list_is_rejected() {
    let cli = Cli::try_parse_from([
        "stale-scan", "--org", "acme", "--itaps", " ", "--months", "6", "--out", "r",
    ])
    .unwrap();
    assert!(matches!(ScanConfig::resolve(&cli, &env()), Err(ValidationError::EmptyItapList)));
}

#[test]
fn concurrency_is_bounded() {
    assert!(matches!(
        ScanConfig::resolve(&cli(&["--concurrency", "0"]), &env()),
        Err(ValidationError::InvalidConcurrency { value: 0, .. })
    ));
    assert!(ScanConfig::resolve(&cli(&["--concurrency", "1000"]), &env()).is_err());
}

#[test]
fn zero_timeout_is_rejected() {
    assert!(matches!(
        ScanConfig::resolve(&cli(&["--timeout-secs", "0"]), &env()),
        Err(ValidationError::InvalidTimeout(_))
    ));
}

#[test]
fn required_flags_are_enforced_by_the_parser() {
    let no_itaps = ["stale-scan", "--org", "acme", "--months", "6", "--out", "r"];
    let no_out = ["stale-scan", "--org", "acme", "--itaps", "APM1", "--months", "6"];
    assert!(Cli::try_parse_from(no_itaps).is_err());
    assert!(Cli::try_parse_from(no_out).is_err());
}

// =============================================================================
// Layering
// =============================================================================

#[test]
fn config_file_fills_in_unset_flags() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("scan.toml");
    fs::write(
        &path,
        r#"
api_url = "https://ghe.example.com/api/v3"
concurrency = 3
timeout_secs = 60
exclude_protected = true
excluded_branches = ["main", "release/*"]
itap_property = ""

[retry]
max_attempts = 5
"#,
    )
    .unwrap();

    let config =
        ScanConfig::resolve(&cli(&["--config", path.to_str().unwrap(), "--concurrency", "2"]), &env())
            .unwrap();

    assert_eq!(config.client.api_url.as_str(), "https://ghe.example.com/api/v3");
    assert_eq!(config.concurrency, 2);
    assert_eq!(config.timeout, Duration::from_secs(60));
    assert!(config.branch_policy.excludes_protected());
    assert_eq!(config.branch_policy.patterns().collect::<Vec<_>>(), vec!["main", "release/*"]);
    assert_eq!(config.client.itap_property, None);
    assert_eq!(config.client.retry.max_attempts, 5);
}

#[test]
fn api_url_precedence_is_flag_then_env_then_file() {
    let env = Environment {
        token: Some("t".to_string()),
        api_url: Some("https://env.example.com".to_string()),
    };
    let from_env = ScanConfig::resolve(&cli(&[]), &env).unwrap();
    assert_eq!(from_env.client.api_url.host_str(), Some("env.example.com"));

    let from_flag = ScanConfig::resolve(&cli(&["--api-url", "http://127.0.0.1:9"]), &env).unwrap();
    assert_eq!(from_flag.client.api_url.host_str(), Some("127.0.0.1"));
}

#[test]
fn unknown_config_keys_are_rejected() {
    let err = ScanSettings::parse("conccurency = 3", std::path::Path::new("scan.toml")).unwrap_err();
    assert!(matches!(err, ValidationError::ConfigParse { .. }));
}

#[test]
fn missing_config_file_is_a_validation_error() {
    let err = ScanConfig::resolve(&cli(&["--config", "/nonexistent/scan.toml"]), &env()).unwrap_err();
    assert!(matches!(err, ValidationError::ConfigRead { .. }));
}

#[test]
fn bad_branch_pattern_is_rejected() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("scan.toml");
    fs::write(&path, "excluded_branches = [\"[\"]\n").unwrap();
    assert!(matches!(
        ScanConfig::resolve(&cli(&["--config", path.to_str().unwrap()]), &env()),
        Err(ValidationError::InvalidBranchPattern { .. })
    ));
}

#[test]
fn json_flag_selects_json_progress() {
    let config = ScanConfig::resolve(&cli(&["--json"]), &env()).unwrap();
    assert_eq!(config.output, OutputMode::Json);
}
