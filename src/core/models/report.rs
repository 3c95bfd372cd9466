//! Scan report and run metadata
//!
//! The report is the only thing the scanner owes downstream: the ordered
//! candidates plus enough metadata to audit a partial run (how many
//! repositories were skipped and why).

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::StaleCandidate;
use crate::error::ApiError;

/// Why a repository was left out of the inventory
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    /// Token rejected for this repository (401)
    AuthenticationFailed,
    /// Rate-limit budget exhausted while scanning it
    RateLimited,
    /// Access denied or repository disabled (403, 451)
    AccessDenied,
    /// Repository or branch listing vanished (404, 410)
    NotFound,
    /// Transient failures exhausted their retries, or another 4xx
    Unavailable,
    /// GitHub answered with a body we could not decode
    InvalidResponse,
}

impl SkipReason {
    /// Stable identifier used in reports and progress output
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "authentication-failed",
            Self::RateLimited => "rate-limited",
            Self::AccessDenied => "access-denied",
            Self::NotFound => "not-found",
            Self::Unavailable => "unavailable",
            Self::InvalidResponse => "invalid-response",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&ApiError> for SkipReason {
    fn from(err: &ApiError) -> Self {
        match err {
            ApiError::AuthenticationFailed { .. } => Self::AuthenticationFailed,
            ApiError::RateLimitExceeded { .. } => Self::RateLimited,
            ApiError::Decode { .. } => Self::InvalidResponse,
            ApiError::ResourceUnavailable { status, .. } => match status {
                Some(403 | 451) => Self::AccessDenied,
                Some(404 | 410) => Self::NotFound,
                _ => Self::Unavailable,
            },
        }
    }
}

/// A repository that could not be scanned
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRepository {
    /// `owner/name`
    pub repository: String,
    /// Reason category
    pub reason: SkipReason,
    /// Error detail for the log and the report
    pub detail: String,
}

impl SkippedRepository {
    /// Record a failed repository
    #[must_use]
    pub fn from_error(repository: impl Into<String>, err: &ApiError) -> Self {
        Self {
            repository: repository.into(),
            reason: SkipReason::from(err),
            detail: err.to_string(),
        }
    }
}

/// A branch dropped from the inventory because its last commit was unusable
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchWarning {
    /// `owner/name`
    pub repository: String,
    /// Branch name
    pub branch: String,
    /// What went wrong
    pub detail: String,
}

/// Metadata describing one scan run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunMetadata {
    /// Organization login
    pub org: String,
    /// Minimum age in calendar months
    pub threshold_months: u32,
    /// Requested ITAP ids, normalized and sorted
    pub requested_itaps: Vec<String>,
    /// Scan start; also the fixed "now" used for ages
    pub started_at: DateTime<Utc>,
    /// Scan end; the report generation timestamp
    pub finished_at: DateTime<Utc>,
    /// Distinct repositories returned by the organization listing
    pub repositories_listed: usize,
    /// Repositories inspected without error, in or out of scope
    pub repositories_scanned: usize,
    /// Repositories without a requested ITAP id (not branch-enumerated)
    pub repositories_out_of_scope: usize,
    /// Repositories that failed and were skipped, sorted by name
    pub skipped: Vec<SkippedRepository>,
    /// Branches dropped because their last commit could not be resolved
    pub branch_warnings: Vec<BranchWarning>,
    /// API failures recovered from without aborting the run
    pub api_errors: usize,
    /// Protected branches were excluded by configuration
    pub exclude_protected: bool,
    /// Default branches were excluded by configuration
    pub exclude_default: bool,
    /// Branch name patterns excluded by configuration
    pub excluded_patterns: Vec<String>,
    /// The wall-clock timeout cut the scan short
    pub timed_out: bool,
}

impl RunMetadata {
    /// Number of skipped repositories
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// Skipped repositories per reason category
    #[must_use]
    pub fn skip_reasons(&self) -> BTreeMap<SkipReason, usize> {
        let mut counts = BTreeMap::new();
        for skip in &self.skipped {
            *counts.entry(skip.reason).or_insert(0) += 1;
        }
        counts
    }
}

/// Result of a scan: ordered candidates plus metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// Run metadata
    pub metadata: RunMetadata,
    /// Candidates sorted by (repository, branch), no duplicates
    pub candidates: Vec<StaleCandidate>,
}

impl ScanReport {
    /// Whether no branch qualified
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}
