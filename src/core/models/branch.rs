//! Branches and branch eligibility
//!
//! A [`BranchRef`] is a row of the branch listing. Resolving its head commit
//! yields a [`Branch`] with a last-activity timestamp. [`BranchPolicy`]
//! decides which branches may be reported at all.

use chrono::{DateTime, Utc};
use glob::Pattern;

use crate::error::ValidationError;

/// A branch as returned by the branch listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchRef {
    /// Branch name, e.g. `feature/login`
    pub name: String,
    /// SHA of the head commit
    pub commit_sha: String,
    /// Branch protection enabled
    pub protected: bool,
}

/// Metadata of a branch's head commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    /// Author date, falling back to committer date (UTC)
    pub timestamp: DateTime<Utc>,
    /// Author name, if recorded
    pub author: Option<String>,
}

/// A branch with its resolved last activity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    /// `owner/name` of the owning repository (a key, not an owner)
    pub repository: String,
    /// Branch name
    pub name: String,
    /// Timestamp of the most recent commit (UTC)
    pub last_commit: DateTime<Utc>,
    /// Author of the most recent commit
    pub author: Option<String>,
    /// Branch protection enabled
    pub protected: bool,
    /// This is the repository's default branch
    pub is_default: bool,
}

/// Which branches are eligible for the report
///
/// The reference behaviour includes every branch, default and protected
/// ones too. Exclusions are opt-in through configuration.
#[derive(Debug, Clone, Default)]
pub struct BranchPolicy {
    exclude_protected: bool,
    exclude_default: bool,
    excluded: Vec<Pattern>,
}

impl BranchPolicy {
    /// Branch names the audit pipeline historically skipped
    pub const LEGACY_EXCLUSIONS: [&'static str; 5] =
        ["main", "master", "develop", "prod", "release/*"];

    /// Include every branch
    #[must_use]
    pub fn include_all() -> Self {
        Self::default()
    }

    /// Build a policy from configuration
    ///
    /// `patterns` are glob patterns matched against the full branch name.
    pub fn new(
        exclude_protected: bool,
        exclude_default: bool,
        patterns: &[String],
    ) -> Result<Self, ValidationError> {
        let excluded = patterns
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|source| ValidationError::InvalidBranchPattern {
                    pattern: p.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            exclude_protected,
            exclude_default,
            excluded,
        })
    }

    /// Whether protected branches are left out
    #[must_use]
    pub const fn excludes_protected(&self) -> bool {
        self.exclude_protected
    }

    /// Whether default branches are left out
    #[must_use]
    pub const fn excludes_default(&self) -> bool {
        self.exclude_default
    }

    /// Excluded name patterns as written in the config
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.excluded.iter().map(Pattern::as_str)
    }

    /// Whether `branch` must not be reported
    #[must_use]
    pub fn excludes(&self, branch: &Branch) -> bool {
        (self.exclude_protected && branch.protected)
            || (self.exclude_default && branch.is_default)
            || self.excluded.iter().any(|p| p.matches(&branch.name))
    }
}
