//! Repositories
//!
//! A [`RepoListing`] is what the organization listing returns. Once its ITAP
//! ids are resolved it becomes a [`Repository`], which stays immutable for
//! the rest of the scan.

use std::collections::BTreeSet;

/// A repository as returned by the organization listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoListing {
    /// Numeric GitHub id, stable across renames; used for deduplication
    pub id: u64,
    /// Owning organization login
    pub owner: String,
    /// Repository name without the owner
    pub name: String,
    /// Name of the default branch (the branch itself may have been deleted)
    pub default_branch: String,
    /// Archived (read-only) repository
    pub archived: bool,
    /// Disabled by GitHub; API calls against it fail
    pub disabled: bool,
    /// Free-text description
    pub description: Option<String>,
    /// Repository topics
    pub topics: Vec<String>,
}

impl RepoListing {
    /// `owner/name` identifier
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// A repository with its associated ITAP ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    /// Numeric GitHub id
    pub id: u64,
    /// `owner/name` identifier
    pub full_name: String,
    /// Repository name without the owner
    pub name: String,
    /// Name of the default branch
    pub default_branch: String,
    /// Archived (read-only) repository
    pub archived: bool,
    /// Normalized ITAP ids, possibly empty
    pub itap_ids: BTreeSet<String>,
}

impl Repository {
    /// Attach resolved ITAP ids to a listing
    #[must_use]
    pub fn from_listing(listing: &RepoListing, itap_ids: BTreeSet<String>) -> Self {
        Self {
            id: listing.id,
            full_name: listing.full_name(),
            name: listing.name.clone(),
            default_branch: listing.default_branch.clone(),
            archived: listing.archived,
            itap_ids,
        }
    }
}
