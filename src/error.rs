//! Error taxonomy and exit code mapping
//!
//! Three layers of errors, one per seam:
//!
//! - [`ValidationError`] - bad CLI input or configuration, raised before any
//!   network call
//! - [`ApiError`] - a single GitHub API operation failed after the client's
//!   own retry and rate-limit handling
//! - [`ScanError`] - a run-level failure that aborts the scan
//!
//! Per-repository API failures never become a [`ScanError`]; the inventory
//! builder records them as skipped repositories instead.

use std::path::PathBuf;

use thiserror::Error;

use crate::report::ReportError;

/// Process exit status of a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Scan completed, including the zero-candidates case
    Success,
    /// Bad CLI input or configuration
    Validation,
    /// Unrecoverable API, authentication or report-writing failure
    Api,
    /// Wall-clock timeout; a partial report was still written
    Timeout,
}

impl ExitStatus {
    /// Numeric process exit code
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Validation => 1,
            Self::Api => 2,
            Self::Timeout => 3,
        }
    }
}

/// Invalid command-line input or configuration
#[derive(Debug, Error)]
pub enum ValidationError {
    /// `--org` was blank or not a plain organization login
    #[error("--org must be a non-empty organization login, got {0:?}")]
    InvalidOrg(String),

    /// `--itaps` had no tokens at all
    #[error("--itaps must be a non-empty comma-separated list of ITAP ids")]
    EmptyItapList,

    /// `--itaps` contained an empty entry such as `APM1,,APM2`
    #[error("--itaps contains an empty entry: {0:?}")]
    EmptyItapToken(String),

    /// `--months` was not a positive integer
    #[error("--months must be a positive integer, got {0:?}")]
    InvalidMonths(String),

    /// Worker pool size out of range
    #[error("concurrency must be between 1 and {max}, got {value}")]
    InvalidConcurrency {
        /// Requested value
        value: usize,
        /// Upper bound
        max: usize,
    },

    /// Timeout of zero seconds
    #[error("{0} must be a positive number of seconds")]
    InvalidTimeout(&'static str),

    /// Page size outside what the GitHub API accepts
    #[error("per_page must be between 1 and 100, got {0}")]
    InvalidPageSize(u32),

    /// Access token environment variable missing or blank
    #[error("{0} is not set; an organization-scoped read token is required")]
    MissingToken(&'static str),

    /// API base URL could not be parsed
    #[error("invalid API URL {url:?}: {reason}")]
    InvalidApiUrl {
        /// The offending URL
        url: String,
        /// Parser message
        reason: String,
    },

    /// ITAP id regex did not compile
    #[error("invalid itap_pattern {pattern:?}: {source}")]
    InvalidItapPattern {
        /// The offending pattern
        pattern: String,
        /// Compile error
        #[source]
        source: regex::Error,
    },

    /// Branch exclusion glob did not compile
    #[error("invalid excluded branch pattern {pattern:?}: {source}")]
    InvalidBranchPattern {
        /// The offending pattern
        pattern: String,
        /// Compile error
        #[source]
        source: glob::PatternError,
    },

    /// Config file could not be read
    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        /// Config file path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`crate::config::ScanSettings`]
    #[error("failed to parse config file {path}: {source}")]
    ConfigParse {
        /// Config file path
        path: PathBuf,
        /// Underlying TOML error
        #[source]
        source: toml::de::Error,
    },
}

/// A GitHub API operation that failed after retries
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// 401: token missing, expired or revoked
    #[error("authentication failed ({status}) for {url}: {message}")]
    AuthenticationFailed {
        /// HTTP status
        status: u16,
        /// Request URL
        url: String,
        /// Response body excerpt
        message: String,
    },

    /// Rate-limit budget still exhausted after the bounded number of waits
    #[error("rate limit exceeded for {url} after {attempts} waits")]
    RateLimitExceeded {
        /// Request URL
        url: String,
        /// Number of rate-limit suspensions performed
        attempts: u32,
    },

    /// Resource inaccessible: 403/404/409 and other non-retryable 4xx, or a
    /// transient failure that exhausted its retries (`status` is `None`)
    #[error("resource unavailable{} at {url}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    ResourceUnavailable {
        /// HTTP status, if a response was received
        status: Option<u16>,
        /// Request URL
        url: String,
        /// Response body excerpt or transport error
        message: String,
    },

    /// Response body did not match the expected shape
    #[error("unexpected response from {url}: {message}")]
    Decode {
        /// Request URL
        url: String,
        /// Deserialization error
        message: String,
    },
}

impl ApiError {
    /// Whether this failure applies to the whole organization rather than a
    /// single repository
    #[must_use]
    pub const fn is_org_wide(&self) -> bool {
        matches!(self, Self::AuthenticationFailed { .. } | Self::RateLimitExceeded { .. })
    }

    /// HTTP status, when the failure came from a response
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::AuthenticationFailed { status, .. } => Some(*status),
            Self::ResourceUnavailable { status, .. } => *status,
            Self::RateLimitExceeded { .. } | Self::Decode { .. } => None,
        }
    }
}

/// Run-level failure that aborts the scan
#[derive(Debug, Error)]
pub enum ScanError {
    /// Invalid input, reported before any network call
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Token rejected and no repository could be scanned
    #[error(transparent)]
    AuthenticationFailed(ApiError),

    /// Rate-limit budget exhausted and no repository could be scanned
    #[error(transparent)]
    RateLimitExceeded(ApiError),

    /// Organization repository listing failed
    #[error("organization {org} unavailable: {source}")]
    OrganizationUnavailable {
        /// Organization login
        org: String,
        /// Listing failure
        #[source]
        source: ApiError,
    },

    /// Report files could not be written
    #[error(transparent)]
    Report(#[from] ReportError),

    /// HTTP client could not be built
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Async runtime could not be started
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

impl ScanError {
    /// Lift an org-wide [`ApiError`] into the matching run-level failure
    #[must_use]
    pub fn from_api(org: &str, err: ApiError) -> Self {
        match err {
            ApiError::AuthenticationFailed { .. } => Self::AuthenticationFailed(err),
            ApiError::RateLimitExceeded { .. } => Self::RateLimitExceeded(err),
            other => Self::OrganizationUnavailable {
                org: org.to_string(),
                source: other,
            },
        }
    }

    /// Exit status this failure maps to
    #[must_use]
    pub const fn exit_status(&self) -> ExitStatus {
        match self {
            Self::Validation(_) => ExitStatus::Validation,
            Self::AuthenticationFailed(_)
            | Self::RateLimitExceeded(_)
            | Self::OrganizationUnavailable { .. }
            | Self::Report(_)
            | Self::Client(_)
            | Self::Runtime(_) => ExitStatus::Api,
        }
    }
}
