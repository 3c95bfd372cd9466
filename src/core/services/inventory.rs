//! Inventory builder - walks an organization into (repository, branch) records
//!
//! Repositories are scanned concurrently by a bounded pool of tokio tasks.
//! Each worker resolves a repository's ITAP ids, lists its branches only when
//! the repository is in scope for the requested ids, and resolves every
//! branch's head commit. Failures stay local to their repository:
//!
//! - an error on one branch's commit drops that branch with a warning
//! - any other error skips the repository and is recorded
//! - only the organization listing itself can fail the build
//!
//! The build also stops at the wall-clock deadline; whatever finished by
//! then is returned with `timed_out` set.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{Instant, timeout_at};

use crate::core::models::{
    Branch, BranchWarning, ItapExtractor, ItapFilter, RepoListing, Repository, SkipReason,
    SkippedRepository, normalize_itap,
};
use crate::core::ports::GitHubSource;
use crate::error::ApiError;

/// A scanned repository and its resolvable branches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryInventory {
    /// Repository with ITAP ids attached
    pub repository: Repository,
    /// Branches with a resolved last commit, in listing order
    pub branches: Vec<Branch>,
}

/// Everything discovered for an organization in one scan
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    /// Fully scanned repositories, sorted by `owner/name`
    pub repositories: Vec<RepositoryInventory>,
    /// Distinct repositories returned by the listing
    pub repositories_listed: usize,
    /// Repositories without a requested ITAP id, or archived ones when
    /// archived repositories are skipped
    pub out_of_scope: usize,
    /// Repositories that failed, sorted by name
    pub skipped: Vec<SkippedRepository>,
    /// Branches dropped for an unusable head commit
    pub branch_warnings: Vec<BranchWarning>,
    /// API failures recovered from
    pub api_errors: usize,
    /// First organization-wide failure (authentication or rate limit)
    pub fatal: Option<ApiError>,
    /// The deadline cut the build short
    pub timed_out: bool,
}

impl Inventory {
    /// Repositories that completed without error, in or out of scope
    #[must_use]
    pub fn completed(&self) -> usize {
        self.repositories.len() + self.out_of_scope
    }

    /// Total branches across scanned repositories
    #[must_use]
    pub fn branch_count(&self) -> usize {
        self.repositories.iter().map(|r| r.branches.len()).sum()
    }

    fn record(&mut self, outcome: RepoOutcome) {
        match outcome {
            RepoOutcome::Scanned {
                inventory,
                warnings,
                api_errors,
            } => {
                debug!(
                    "scanned {} ({} branches, {} warnings)",
                    inventory.repository.full_name,
                    inventory.branches.len(),
                    warnings.len()
                );
                self.repositories.push(inventory);
                self.branch_warnings.extend(warnings);
                self.api_errors += api_errors;
            },
            RepoOutcome::OutOfScope { api_errors } => {
                self.out_of_scope += 1;
                self.api_errors += api_errors;
            },
            RepoOutcome::Skipped {
                skipped,
                error,
                api_errors,
            } => {
                warn!("skipping {}: {}", skipped.repository, skipped.detail);
                if let Some(err) = error {
                    self.api_errors += 1;
                    if err.is_org_wide() && self.fatal.is_none() {
                        self.fatal = Some(err);
                    }
                }
                self.api_errors += api_errors;
                self.skipped.push(skipped);
            },
        }
    }
}

/// Settings for one inventory build
#[derive(Debug, Clone)]
pub struct InventoryOptions {
    /// Requested ITAP ids; repositories outside them are not branch-enumerated
    pub filter: ItapFilter,
    /// Finds ITAP ids in names, descriptions and topics
    pub extractor: ItapExtractor,
    /// Repositories scanned concurrently
    pub concurrency: usize,
    /// Leave archived repositories out
    pub skip_archived: bool,
    /// Abandon in-flight work at this instant
    pub deadline: Instant,
}

/// Result of one repository worker
enum RepoOutcome {
    Scanned {
        inventory: RepositoryInventory,
        warnings: Vec<BranchWarning>,
        api_errors: usize,
    },
    OutOfScope {
        api_errors: usize,
    },
    Skipped {
        skipped: SkippedRepository,
        error: Option<ApiError>,
        api_errors: usize,
    },
}

/// Build the inventory of `org`
///
/// Fails only when the organization listing fails; per-repository failures
/// are recorded in the returned [`Inventory`].
pub async fn build_inventory<S>(
    source: Arc<S>,
    org: &str,
    options: &InventoryOptions,
) -> Result<Inventory, ApiError>
where
    S: GitHubSource + 'static,
{
    let mut inventory = Inventory::default();

    let mut listings = match timeout_at(options.deadline, source.list_repositories(org)).await {
        Ok(listing) => listing?,
        Err(_) => {
            warn!("deadline reached while listing repositories of {org}");
            inventory.timed_out = true;
            return Ok(inventory);
        },
    };

    let mut seen = HashSet::new();
    listings.retain(|repo| seen.insert(repo.id));
    inventory.repositories_listed = listings.len();
    info!("{org}: {} repositories listed", listings.len());

    let scope = Arc::new((options.filter.clone(), options.extractor.clone()));
    let permits = Arc::new(Semaphore::new(options.concurrency.max(1)));
    let mut workers = JoinSet::new();

    for listing in listings {
        if options.skip_archived && listing.archived {
            debug!("{}: archived, not scanned", listing.full_name());
            inventory.out_of_scope += 1;
            continue;
        }
        if listing.disabled {
            inventory.skipped.push(SkippedRepository {
                repository: listing.full_name(),
                reason: SkipReason::AccessDenied,
                detail: "repository is disabled".to_string(),
            });
            continue;
        }

        let source = Arc::clone(&source);
        let scope = Arc::clone(&scope);
        let permits = Arc::clone(&permits);
        workers.spawn(async move {
            // The semaphore is never closed, so acquisition only fails on shutdown
            let _permit = permits.acquire_owned().await.ok();
            let (filter, extractor) = scope.as_ref();
            scan_repository(source.as_ref(), listing, filter, extractor).await
        });
    }

    loop {
        match timeout_at(options.deadline, workers.join_next()).await {
            Ok(Some(Ok(outcome))) => inventory.record(outcome),
            Ok(Some(Err(e))) => {
                error!("repository worker failed: {e}");
                inventory.api_errors += 1;
            },
            Ok(None) => break,
            Err(_) => {
                warn!("deadline reached; abandoning {} in-flight repositories", workers.len());
                workers.abort_all();
                inventory.timed_out = true;
                break;
            },
        }
    }

    inventory.repositories.sort_by(|a, b| a.repository.full_name.cmp(&b.repository.full_name));
    inventory.skipped.sort_by(|a, b| a.repository.cmp(&b.repository));
    inventory
        .branch_warnings
        .sort_by(|a, b| (&a.repository, &a.branch).cmp(&(&b.repository, &b.branch)));

    Ok(inventory)
}

/// ITAP ids of a repository found without extra API calls
///
/// Pattern matches in the name, description and topics, topics equal to a
/// requested id, and requested ids occurring in the name.
#[must_use]
pub fn listed_itap_ids(
    listing: &RepoListing,
    filter: &ItapFilter,
    extractor: &ItapExtractor,
) -> BTreeSet<String> {
    let mut ids: BTreeSet<String> = extractor.extract(&listing.name).collect();
    if let Some(description) = &listing.description {
        ids.extend(extractor.extract(description));
    }
    for topic in &listing.topics {
        ids.extend(extractor.extract(topic));
        if filter.contains(topic) {
            ids.insert(normalize_itap(topic));
        }
    }
    ids.extend(filter.found_in(&listing.name).map(str::to_string));
    ids
}

async fn scan_repository<S>(
    source: &S,
    listing: RepoListing,
    filter: &ItapFilter,
    extractor: &ItapExtractor,
) -> RepoOutcome
where
    S: GitHubSource,
{
    let full_name = listing.full_name();
    let mut api_errors = 0;
    let mut ids = listed_itap_ids(&listing, filter, extractor);

    match source.itap_metadata(&listing).await {
        Ok(values) => ids.extend(
            values.iter().map(|v| normalize_itap(v)).filter(|v| !v.is_empty()),
        ),
        Err(e) if e.is_org_wide() => return skipped(full_name, e, api_errors),
        Err(e) => {
            warn!("{full_name}: ITAP metadata unavailable, using name and topics only: {e}");
            api_errors += 1;
        },
    }

    let repository = Repository::from_listing(&listing, ids);
    if !filter.admits(&repository.itap_ids) {
        debug!("{full_name}: no requested ITAP id, not scanned");
        return RepoOutcome::OutOfScope { api_errors };
    }

    let refs = match source.list_branches(&listing).await {
        Ok(refs) => refs,
        Err(e) => return skipped(full_name, e, api_errors),
    };

    let mut names = HashSet::new();
    let mut branches = Vec::with_capacity(refs.len());
    let mut warnings = Vec::new();

    for branch in refs {
        if !names.insert(branch.name.clone()) {
            continue;
        }
        match source.last_commit(&listing, &branch).await {
            Ok(Some(commit)) => branches.push(Branch {
                repository: full_name.clone(),
                is_default: branch.name == listing.default_branch,
                name: branch.name,
                last_commit: commit.timestamp,
                author: commit.author,
                protected: branch.protected,
            }),
            Ok(None) => {
                warn!("{full_name}@{}: head commit has no date, excluded", branch.name);
                warnings.push(BranchWarning {
                    repository: full_name.clone(),
                    branch: branch.name,
                    detail: "head commit has no author or committer date".to_string(),
                });
            },
            Err(e) if e.is_org_wide() => return skipped(full_name, e, api_errors),
            Err(e) => {
                warn!("{full_name}@{}: last commit unresolved, excluded: {e}", branch.name);
                api_errors += 1;
                warnings.push(BranchWarning {
                    repository: full_name.clone(),
                    branch: branch.name,
                    detail: e.to_string(),
                });
            },
        }
    }

    RepoOutcome::Scanned {
        inventory: RepositoryInventory {
            repository,
            branches,
        },
        warnings,
        api_errors,
    }
}

fn skipped(repository: String, error: ApiError, api_errors: usize) -> RepoOutcome {
    RepoOutcome::Skipped {
        skipped: SkippedRepository::from_error(repository, &error),
        error: Some(error),
        api_errors,
    }
}
