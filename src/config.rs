//! Scan configuration
//!
//! Settings come from three layers, highest priority first:
//!
//! 1. command-line flags ([`Cli`])
//! 2. environment ([`Environment`]: `GITHUB_TOKEN`, `GITHUB_API_URL`)
//! 3. an optional TOML file ([`ScanSettings`], passed with `--config`)
//!
//! [`ScanConfig::resolve`] validates everything once and produces an
//! immutable [`ScanConfig`] that is handed to the orchestrator. Nothing
//! here touches the network.
//!
//! ```toml
//! api_url = "https://ghe.example.com/api/v3"
//! concurrency = 8
//! itap_pattern = "APM\\d{7}"
//! exclude_protected = true
//! excluded_branches = ["main", "release/*"]
//!
//! [retry]
//! max_attempts = 3
//! base_delay_ms = 1000
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;

use crate::adapters::github::{ClientOptions, RetryPolicy};
use crate::cli::Cli;
use crate::core::models::{BranchPolicy, ItapExtractor, ItapFilter};
use crate::error::ValidationError;
use crate::output::OutputMode;

/// Public GitHub API root
pub const DEFAULT_API_URL: &str = "https://api.github.com";
/// Worker pool size
pub const DEFAULT_CONCURRENCY: usize = 8;
/// Largest accepted worker pool
pub const MAX_CONCURRENCY: usize = 64;
/// Overall wall-clock budget, matching the pipeline's 30-minute ceiling
pub const DEFAULT_TIMEOUT_SECS: u64 = 30 * 60;
/// Per-request HTTP timeout
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
/// GitHub's maximum page size
pub const DEFAULT_PER_PAGE: u32 = 100;
/// Custom property holding ITAP ids
pub const DEFAULT_ITAP_PROPERTY: &str = "itap";

// =============================================================================
// ACCESS TOKEN
// =============================================================================

/// GitHub access token; never printed
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a raw token
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for the Authorization header only
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

// =============================================================================
// ENVIRONMENT
// =============================================================================

/// Values read from the process environment
#[derive(Debug, Clone, Default)]
pub struct Environment {
    /// `GITHUB_TOKEN`
    pub token: Option<String>,
    /// `GITHUB_API_URL`
    pub api_url: Option<String>,
}

impl Environment {
    /// Access token variable
    pub const TOKEN_VAR: &'static str = "GITHUB_TOKEN";
    /// Alternate API root variable
    pub const API_URL_VAR: &'static str = "GITHUB_API_URL";

    /// Snapshot the current process environment
    #[must_use]
    pub fn from_process() -> Self {
        Self {
            token: std::env::var(Self::TOKEN_VAR).ok(),
            api_url: std::env::var(Self::API_URL_VAR).ok(),
        }
    }
}

// =============================================================================
// TOML SETTINGS FILE
// =============================================================================

/// Optional settings file; every key may be omitted
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanSettings {
    /// API root
    pub api_url: Option<String>,
    /// Worker pool size
    pub concurrency: Option<usize>,
    /// Overall wall-clock budget in seconds
    pub timeout_secs: Option<u64>,
    /// Per-request timeout in seconds
    pub request_timeout_secs: Option<u64>,
    /// Page size for list endpoints
    pub per_page: Option<u32>,
    /// Regex finding ITAP ids in names, topics and descriptions
    pub itap_pattern: Option<String>,
    /// Custom property holding ITAP ids; empty string disables the lookup
    pub itap_property: Option<String>,
    /// Leave protected branches out of the report
    pub exclude_protected: Option<bool>,
    /// Leave default branches out of the report
    pub exclude_default_branch: Option<bool>,
    /// Glob patterns of branch names to leave out
    pub excluded_branches: Option<Vec<String>>,
    /// Do not scan archived repositories
    pub skip_archived: Option<bool>,
    /// Retry bounds
    pub retry: RetrySettings,
}

/// `[retry]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrySettings {
    /// Total attempts for transient failures
    pub max_attempts: Option<u32>,
    /// First backoff delay in milliseconds
    pub base_delay_ms: Option<u64>,
    /// Backoff cap in milliseconds
    pub max_delay_ms: Option<u64>,
    /// Rate-limit suspensions allowed per request
    pub rate_limit_retries: Option<u32>,
}

impl RetrySettings {
    /// Overlay these settings on the default policy
    #[must_use]
    pub fn to_policy(&self) -> RetryPolicy {
        let defaults = RetryPolicy::default();
        RetryPolicy {
            max_attempts: self.max_attempts.unwrap_or(defaults.max_attempts).max(1),
            base_delay: self.base_delay_ms.map_or(defaults.base_delay, Duration::from_millis),
            max_delay: self.max_delay_ms.map_or(defaults.max_delay, Duration::from_millis),
            rate_limit_retries: self.rate_limit_retries.unwrap_or(defaults.rate_limit_retries),
        }
    }
}

impl ScanSettings {
    /// Load settings from a TOML file
    pub fn load(path: &Path) -> Result<Self, ValidationError> {
        let content = fs::read_to_string(path).map_err(|source| ValidationError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    /// Parse settings; `path` is only used in error messages
    pub fn parse(content: &str, path: &Path) -> Result<Self, ValidationError> {
        toml::from_str(content).map_err(|source| ValidationError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

// =============================================================================
// RESOLVED CONFIG
// =============================================================================

/// Validated, immutable configuration for one scan
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Organization login
    pub org: String,
    /// Requested ITAP ids (never empty when built by [`ScanConfig::resolve`])
    pub itaps: ItapFilter,
    /// Minimum age in calendar months
    pub months: u32,
    /// Report output directory, created if absent
    pub out_dir: PathBuf,
    /// GitHub connection settings
    pub client: ClientOptions,
    /// Repositories scanned concurrently
    pub concurrency: usize,
    /// Overall wall-clock budget
    pub timeout: Duration,
    /// Finds ITAP ids in repository metadata
    pub itap_extractor: ItapExtractor,
    /// Which branches may be reported
    pub branch_policy: BranchPolicy,
    /// Do not scan archived repositories
    pub skip_archived: bool,
    /// Progress output format
    pub output: OutputMode,
}

impl ScanConfig {
    /// Combine CLI flags, environment and the optional settings file
    pub fn resolve(cli: &Cli, env: &Environment) -> Result<Self, ValidationError> {
        let org = validate_org(&cli.org)?;
        let itaps = ItapFilter::parse(&cli.itaps)?;
        let months = parse_months(&cli.months)?;

        let token = env
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(AccessToken::new)
            .ok_or(ValidationError::MissingToken(Environment::TOKEN_VAR))?;

        let settings = match &cli.config {
            Some(path) => ScanSettings::load(path)?,
            None => ScanSettings::default(),
        };

        let api_url = cli
            .api_url
            .as_deref()
            .or(env.api_url.as_deref().filter(|u| !u.trim().is_empty()))
            .or(settings.api_url.as_deref())
            .unwrap_or(DEFAULT_API_URL);
        let api_url = parse_api_url(api_url)?;

        let concurrency = cli.concurrency.or(settings.concurrency).unwrap_or(DEFAULT_CONCURRENCY);
        let timeout_secs = cli.timeout_secs.or(settings.timeout_secs).unwrap_or(DEFAULT_TIMEOUT_SECS);
        let request_timeout_secs =
            settings.request_timeout_secs.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        if request_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("request_timeout_secs"));
        }
        let per_page = settings.per_page.unwrap_or(DEFAULT_PER_PAGE);
        if !(1..=100).contains(&per_page) {
            return Err(ValidationError::InvalidPageSize(per_page));
        }

        let itap_extractor = ItapExtractor::new(
            settings.itap_pattern.as_deref().unwrap_or(ItapExtractor::DEFAULT_PATTERN),
        )?;
        let itap_property = match settings.itap_property {
            Some(p) if p.trim().is_empty() => None,
            Some(p) => Some(p.trim().to_string()),
            None => Some(DEFAULT_ITAP_PROPERTY.to_string()),
        };

        let branch_policy = BranchPolicy::new(
            cli.exclude_protected || settings.exclude_protected.unwrap_or(false),
            settings.exclude_default_branch.unwrap_or(false),
            settings.excluded_branches.as_deref().unwrap_or_default(),
        )?;

        let config = Self {
            org,
            itaps,
            months,
            out_dir: cli.out.clone(),
            client: ClientOptions {
                api_url,
                token,
                per_page,
                request_timeout: Duration::from_secs(request_timeout_secs),
                retry: settings.retry.to_policy(),
                itap_property,
            },
            concurrency,
            timeout: Duration::from_secs(timeout_secs),
            itap_extractor,
            branch_policy,
            skip_archived: settings.skip_archived.unwrap_or(false),
            output: if cli.json { OutputMode::Json } else { OutputMode::Human },
        };
        config.validate()?;
        Ok(config)
    }

    /// Re-check the invariants the orchestrator relies on
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_org(&self.org)?;
        if self.itaps.is_empty() {
            return Err(ValidationError::EmptyItapList);
        }
        if self.months == 0 {
            return Err(ValidationError::InvalidMonths(self.months.to_string()));
        }
        if !(1..=MAX_CONCURRENCY).contains(&self.concurrency) {
            return Err(ValidationError::InvalidConcurrency {
                value: self.concurrency,
                max: MAX_CONCURRENCY,
            });
        }
        if self.timeout.is_zero() {
            return Err(ValidationError::InvalidTimeout("timeout_secs"));
        }
        Ok(())
    }
}

fn validate_org(raw: &str) -> Result<String, ValidationError> {
    let org = raw.trim();
    if org.is_empty() || org.contains('/') || org.contains(char::is_whitespace) {
        return Err(ValidationError::InvalidOrg(raw.to_string()));
    }
    Ok(org.to_string())
}

/// Parse `--months`: a positive integer
pub fn parse_months(raw: &str) -> Result<u32, ValidationError> {
    match raw.trim().parse::<u32>() {
        Ok(months) if months > 0 => Ok(months),
        _ => Err(ValidationError::InvalidMonths(raw.to_string())),
    }
}

fn parse_api_url(raw: &str) -> Result<Url, ValidationError> {
    let url = Url::parse(raw.trim()).map_err(|e| ValidationError::InvalidApiUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ValidationError::InvalidApiUrl {
            url: raw.to_string(),
            reason: "expected an http(s) URL".to_string(),
        });
    }
    Ok(url)
}
