//! Staleness filter - turns an inventory into report candidates
//!
//! This service is pure: it takes the inventory and the scan start time and
//! returns candidates. No I/O.

use chrono::{DateTime, Datelike, Months, Utc};

use super::inventory::Inventory;
use crate::core::models::{BranchPolicy, ItapFilter, StaleCandidate};

/// Complete calendar months elapsed from `then` to `now`
///
/// A month counts once the same day and time of day is reached again, with
/// the day clamped to the end of shorter months (January 31 plus one month
/// is the last day of February). Commits dated after `now` are zero months
/// old.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use stale_scan::core::services::months_between;
///
/// let now = Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap();
/// assert_eq!(months_between(now, Utc.with_ymd_and_hms(2024, 11, 1, 0, 0, 0).unwrap()), 6);
/// assert_eq!(months_between(now, Utc.with_ymd_and_hms(2024, 11, 30, 23, 0, 0).unwrap()), 5);
/// ```
#[must_use]
pub fn months_between(now: DateTime<Utc>, then: DateTime<Utc>) -> u32 {
    if then >= now {
        return 0;
    }
    let index = |ts: &DateTime<Utc>| i64::from(ts.year()) * 12 + i64::from(ts.month0());
    let months = u32::try_from(index(&now) - index(&then)).unwrap_or(0);
    // The month index overshoots by one while the anniversary is still ahead
    if months > 0 && then.checked_add_months(Months::new(months)).is_none_or(|due| due > now) {
        months - 1
    } else {
        months
    }
}

/// Inputs for one filtering pass
#[derive(Debug, Clone, Copy)]
pub struct StalenessCriteria<'a> {
    /// Minimum age in months (inclusive)
    pub threshold_months: u32,
    /// Requested ITAP ids
    pub filter: &'a ItapFilter,
    /// Branch exclusions
    pub policy: &'a BranchPolicy,
    /// Scan start, fixed for the whole run
    pub now: DateTime<Utc>,
}

/// Select stale branches of in-scope repositories
///
/// A branch qualifies when its repository carries at least one requested
/// ITAP id, the branch policy does not exclude it, and its last commit is at
/// least `threshold_months` old. The result is sorted by repository then
/// branch with no duplicate pairs.
#[must_use]
pub fn filter_candidates(inventory: &Inventory, criteria: &StalenessCriteria<'_>) -> Vec<StaleCandidate> {
    let mut candidates = Vec::new();

    for entry in &inventory.repositories {
        let repo = &entry.repository;
        let matched = criteria.filter.matched(&repo.itap_ids);
        if !criteria.filter.is_empty() && matched.is_empty() {
            continue;
        }
        let itap_ids: Vec<String> = matched.into_iter().collect();

        for branch in &entry.branches {
            if criteria.policy.excludes(branch) {
                continue;
            }
            let age_months = months_between(criteria.now, branch.last_commit);
            if age_months < criteria.threshold_months {
                continue;
            }
            candidates.push(StaleCandidate {
                repository: repo.name.clone(),
                branch: branch.name.clone(),
                itap_ids: itap_ids.clone(),
                last_activity: branch.last_commit,
                age_months,
                author: branch.author.clone(),
                protected: branch.protected,
                default_branch: branch.is_default,
            });
        }
    }

    candidates.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    candidates.dedup_by(|a, b| a.sort_key() == b.sort_key());
    candidates
}
