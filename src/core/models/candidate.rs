//! Stale branch candidates

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A branch that met the staleness threshold and the ITAP filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaleCandidate {
    /// Repository name (without owner)
    pub repository: String,
    /// Branch name
    pub branch: String,
    /// ITAP ids of the repository that were requested, sorted
    pub itap_ids: Vec<String>,
    /// Timestamp of the most recent commit (UTC)
    pub last_activity: DateTime<Utc>,
    /// Whole calendar months between last activity and scan start
    pub age_months: u32,
    /// Author of the most recent commit
    pub author: Option<String>,
    /// Branch protection enabled
    pub protected: bool,
    /// This is the repository's default branch
    pub default_branch: bool,
}

impl StaleCandidate {
    /// Sort key giving the report its total order
    #[must_use]
    pub fn sort_key(&self) -> (&str, &str) {
        (&self.repository, &self.branch)
    }
}
