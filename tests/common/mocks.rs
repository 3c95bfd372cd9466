//! Mock implementation of the GitHub port for testing
//!
//! `MockGitHub` serves repositories, branches and commits from memory, with
//! per-repository error injection and a call log for asserting which
//! endpoints were hit.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use stale_scan::core::models::{BranchRef, CommitInfo, RepoListing};
use stale_scan::core::ports::GitHubSource;
use stale_scan::error::ApiError;

/// In-memory GitHub organization
#[derive(Default)]
pub struct MockGitHub {
    repos: Vec<RepoListing>,
    listing_error: Option<ApiError>,
    branches: HashMap<String, Result<Vec<BranchRef>, ApiError>>,
    properties: HashMap<String, Result<Vec<String>, ApiError>>,
    commits: HashMap<String, Result<Option<CommitInfo>, ApiError>>,
    branch_delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
}

impl MockGitHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a repository with its branches, each given as (name, last commit)
    pub fn with_repo(mut self, repo: RepoListing, branches: &[(&str, DateTime<Utc>)]) -> Self {
        let refs = branches
            .iter()
            .map(|(name, timestamp)| {
                let sha = format!("{}-{name}", repo.name);
                self.commits.insert(
                    sha.clone(),
                    Ok(Some(CommitInfo {
                        timestamp: *timestamp,
                        author: Some("Ada".to_string()),
                    })),
                );
                BranchRef {
                    name: (*name).to_string(),
                    commit_sha: sha,
                    protected: false,
                }
            })
            .collect();
        self.branches.insert(repo.name.clone(), Ok(refs));
        self.repos.push(repo);
        self
    }

    /// Add a repository listing only (no branch data)
    pub fn with_listing(mut self, repo: RepoListing) -> Self {
        self.repos.push(repo);
        self
    }

    /// Replace the branch refs of a repository
    pub fn with_branch_refs(mut self, repo: &str, refs: Vec<BranchRef>) -> Self {
        self.branches.insert(repo.to_string(), Ok(refs));
        self
    }

    pub fn with_properties(mut self, repo: &str, values: &[&str]) -> Self {
        self.properties
            .insert(repo.to_string(), Ok(values.iter().map(|v| (*v).to_string()).collect()));
        self
    }

    pub fn with_commit(mut self, sha: &str, commit: Option<CommitInfo>) -> Self {
        self.commits.insert(sha.to_string(), Ok(commit));
        self
    }

    pub fn fail_listing(mut self, error: ApiError) -> Self {
        self.listing_error = Some(error);
        self
    }

    pub fn fail_branches(mut self, repo: &str, error: ApiError) -> Self {
        self.branches.insert(repo.to_string(), Err(error));
        self
    }

    pub fn fail_properties(mut self, repo: &str, error: ApiError) -> Self {
        self.properties.insert(repo.to_string(), Err(error));
        self
    }

    pub fn fail_commit(mut self, sha: &str, error: ApiError) -> Self {
        self.commits.insert(sha.to_string(), Err(error));
        self
    }

    /// Delay every branch listing, for deadline tests
    pub fn slow_branches(mut self, delay: Duration) -> Self {
        self.branch_delay = Some(delay);
        self
    }

    /// Calls made so far, as `operation:target`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

pub fn not_found(url: &str) -> ApiError {
    ApiError::ResourceUnavailable {
        status: Some(404),
        url: url.to_string(),
        message: "Not Found".to_string(),
    }
}

pub fn server_error(url: &str) -> ApiError {
    ApiError::ResourceUnavailable {
        status: None,
        url: url.to_string(),
        message: "502 Bad Gateway (after 3 attempts)".to_string(),
    }
}

pub fn bad_credentials(url: &str) -> ApiError {
    ApiError::AuthenticationFailed {
        status: 401,
        url: url.to_string(),
        message: "Bad credentials".to_string(),
    }
}

impl GitHubSource for MockGitHub {
    async fn list_repositories(&self, org: &str) -> Result<Vec<RepoListing>, ApiError> {
        self.record(format!("repos:{org}"));
        match &self.listing_error {
            Some(error) => Err(error.clone()),
            None => Ok(self.repos.clone()),
        }
    }

    async fn list_branches(&self, repo: &RepoListing) -> Result<Vec<BranchRef>, ApiError> {
        self.record(format!("branches:{}", repo.name));
        if let Some(delay) = self.branch_delay {
            tokio::time::sleep(delay).await;
        }
        self.branches.get(&repo.name).cloned().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn itap_metadata(&self, repo: &RepoListing) -> Result<Vec<String>, ApiError> {
        self.record(format!("properties:{}", repo.name));
        self.properties.get(&repo.name).cloned().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn last_commit(
        &self,
        repo: &RepoListing,
        branch: &BranchRef,
    ) -> Result<Option<CommitInfo>, ApiError> {
        self.record(format!("commit:{}/{}", repo.name, branch.name));
        self.commits
            .get(&branch.commit_sha)
            .cloned()
            .unwrap_or_else(|| Err(not_found(&branch.commit_sha)))
    }
}
