//! Wire types for the GitHub REST responses we read
//!
//! Only the fields the scanner needs are declared; everything is optional or
//! defaulted where GitHub is known to omit it.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::core::models::{BranchRef, CommitInfo, RepoListing};

/// `GET /orgs/{org}/repos` item
#[derive(Debug, Deserialize)]
pub struct RepoDto {
    /// Numeric id
    pub id: u64,
    /// Name without owner
    pub name: String,
    /// Owner account
    #[serde(default)]
    pub owner: Option<OwnerDto>,
    /// Default branch name
    #[serde(default)]
    pub default_branch: Option<String>,
    /// Archived flag
    #[serde(default)]
    pub archived: bool,
    /// Disabled flag
    #[serde(default)]
    pub disabled: bool,
    /// Description
    #[serde(default)]
    pub description: Option<String>,
    /// Topics
    #[serde(default)]
    pub topics: Vec<String>,
}

/// Repository owner
#[derive(Debug, Deserialize)]
pub struct OwnerDto {
    /// Account login
    pub login: String,
}

impl RepoDto {
    /// Convert to the domain listing, defaulting the owner to `org`
    #[must_use]
    pub fn into_listing(self, org: &str) -> RepoListing {
        RepoListing {
            id: self.id,
            owner: self.owner.map_or_else(|| org.to_string(), |o| o.login),
            name: self.name,
            default_branch: self.default_branch.unwrap_or_default(),
            archived: self.archived,
            disabled: self.disabled,
            description: self.description,
            topics: self.topics,
        }
    }
}

/// `GET /repos/{owner}/{repo}/branches` item
#[derive(Debug, Deserialize)]
pub struct BranchDto {
    /// Branch name
    pub name: String,
    /// Head commit reference
    pub commit: BranchCommitDto,
    /// Protection flag
    #[serde(default)]
    pub protected: bool,
}

/// Head commit reference inside a branch listing
#[derive(Debug, Deserialize)]
pub struct BranchCommitDto {
    /// Commit SHA
    pub sha: String,
}

impl From<BranchDto> for BranchRef {
    fn from(dto: BranchDto) -> Self {
        Self {
            name: dto.name,
            commit_sha: dto.commit.sha,
            protected: dto.protected,
        }
    }
}

/// `GET /repos/{owner}/{repo}/commits/{sha}`
#[derive(Debug, Deserialize)]
pub struct CommitDto {
    /// Git-level commit data
    pub commit: GitCommitDto,
}

/// Git-level commit data
#[derive(Debug, Deserialize)]
pub struct GitCommitDto {
    /// Author signature
    #[serde(default)]
    pub author: Option<SignatureDto>,
    /// Committer signature
    #[serde(default)]
    pub committer: Option<SignatureDto>,
}

/// Commit signature
#[derive(Debug, Deserialize)]
pub struct SignatureDto {
    /// Name
    #[serde(default)]
    pub name: Option<String>,
    /// Timestamp
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

impl CommitDto {
    /// Author date, falling back to committer date; `None` without either
    #[must_use]
    pub fn into_info(self) -> Option<CommitInfo> {
        let GitCommitDto { author, committer } = self.commit;
        let timestamp = author
            .as_ref()
            .and_then(|a| a.date)
            .or_else(|| committer.as_ref().and_then(|c| c.date))?;
        Some(CommitInfo {
            timestamp,
            author: author.and_then(|a| a.name).filter(|n| !n.is_empty()),
        })
    }
}

/// `GET /repos/{owner}/{repo}/properties/values` item
#[derive(Debug, Deserialize)]
pub struct PropertyValueDto {
    /// Custom property name
    pub property_name: String,
    /// String, array of strings, or null
    #[serde(default)]
    pub value: Value,
}

/// Values of the custom property `name`, split on commas
#[must_use]
pub fn property_values(properties: Vec<PropertyValueDto>, name: &str) -> Vec<String> {
    properties
        .into_iter()
        .filter(|p| p.property_name.eq_ignore_ascii_case(name))
        .flat_map(|p| match p.value {
            Value::String(s) => s.split(',').map(str::to_string).collect(),
            Value::Array(items) => {
                items.into_iter().filter_map(|v| v.as_str().map(str::to_string)).collect()
            },
            _ => Vec::new(),
        })
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

/// GitHub error body
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    /// Human-readable message
    pub message: String,
}
