//! GitHub API port
//!
//! Defines the read-only GitHub surface the inventory builder needs.

use std::future::Future;

use crate::core::models::{BranchRef, CommitInfo, RepoListing};
use crate::error::ApiError;

/// Read-only access to an organization's repositories and branches
///
/// Listing operations page through the API until exhaustion; calling them
/// again restarts from the first page. Implementations own retries and
/// rate-limit suspension, so an `Err` is final for that operation.
pub trait GitHubSource: Send + Sync {
    /// Every repository of `org`, in API order (may contain duplicates
    /// across pages)
    fn list_repositories(
        &self,
        org: &str,
    ) -> impl Future<Output = Result<Vec<RepoListing>, ApiError>> + Send;

    /// Every branch of `repo`
    fn list_branches(
        &self,
        repo: &RepoListing,
    ) -> impl Future<Output = Result<Vec<BranchRef>, ApiError>> + Send;

    /// Raw ITAP values from the repository's metadata (custom properties),
    /// not yet normalized; empty when the repository has none
    fn itap_metadata(
        &self,
        repo: &RepoListing,
    ) -> impl Future<Output = Result<Vec<String>, ApiError>> + Send;

    /// Head commit of `branch`, or `None` when it carries no usable date
    fn last_commit(
        &self,
        repo: &RepoListing,
        branch: &BranchRef,
    ) -> impl Future<Output = Result<Option<CommitInfo>, ApiError>> + Send;
}
