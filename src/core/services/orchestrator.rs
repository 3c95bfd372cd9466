//! Scan orchestrator - drives one run from validated config to report files
//!
//! ```text
//! Start -> Validating -> Scanning -> Filtering -> Rendering -> Done
//!             |             |                        |
//!             +-------------+------------------------+--> Failed
//! ```
//!
//! A deadline hit during `Scanning` is not a failure: the partial inventory
//! is filtered and rendered like a complete one and the outcome carries
//! [`ExitStatus::Timeout`].

use std::sync::Arc;
use std::time::Instant as StdInstant;

use chrono::{DateTime, Utc};
use log::{debug, error, info};
use tokio::time::Instant;

use super::inventory::{Inventory, InventoryOptions, build_inventory};
use super::staleness::{StalenessCriteria, filter_candidates};
use crate::config::ScanConfig;
use crate::core::models::{RunMetadata, ScanReport};
use crate::core::ports::GitHubSource;
use crate::error::{ApiError, ExitStatus, ScanError};
use crate::output::Progress;
use crate::report::{ReportFiles, write_reports};

/// Lifecycle of a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Not started
    Start,
    /// Checking configuration
    Validating,
    /// Building the inventory
    Scanning,
    /// Selecting stale candidates
    Filtering,
    /// Writing report files
    Rendering,
    /// Reports written
    Done,
    /// Aborted with an error
    Failed,
}

/// Result of a run that produced reports
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// The report that was rendered
    pub report: ScanReport,
    /// Files written
    pub files: ReportFiles,
    /// `Success`, or `Timeout` for a partial report
    pub exit: ExitStatus,
}

/// Runs one scan against a [`GitHubSource`]
#[derive(Debug)]
pub struct Orchestrator<S> {
    config: ScanConfig,
    source: Arc<S>,
    now: DateTime<Utc>,
    state: ScanState,
}

impl<S> Orchestrator<S>
where
    S: GitHubSource + 'static,
{
    /// Create an orchestrator whose scan start is the current time
    pub fn new(config: ScanConfig, source: Arc<S>) -> Self {
        Self {
            config,
            source,
            now: Utc::now(),
            state: ScanState::Start,
        }
    }

    /// Fix the scan start time used for branch ages
    #[must_use]
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Current lifecycle state
    #[must_use]
    pub const fn state(&self) -> ScanState {
        self.state
    }

    /// Execute the run
    ///
    /// Returns an error only for failures with no usable report: invalid
    /// configuration, a failed organization listing, an organization-wide
    /// authentication or rate-limit failure that left nothing scanned, or
    /// report files that could not be written.
    pub async fn run(&mut self) -> Result<ScanOutcome, ScanError> {
        let result = self.execute().await;
        if let Err(e) = &result {
            error!("scan of {} failed: {e}", self.config.org);
            self.transition(ScanState::Failed);
        }
        result
    }

    async fn execute(&mut self) -> Result<ScanOutcome, ScanError> {
        self.transition(ScanState::Validating);
        self.config.validate()?;

        let mode = self.config.output;
        Progress::ScanStarted {
            org: self.config.org.clone(),
            itaps: self.config.itaps.to_string(),
            months: self.config.months,
        }
        .emit(mode);

        self.transition(ScanState::Scanning);
        let started = StdInstant::now();
        let options = InventoryOptions {
            filter: self.config.itaps.clone(),
            extractor: self.config.itap_extractor.clone(),
            concurrency: self.config.concurrency,
            skip_archived: self.config.skip_archived,
            deadline: Instant::now() + self.config.timeout,
        };
        let inventory = build_inventory(Arc::clone(&self.source), &self.config.org, &options)
            .await
            .map_err(|e| ScanError::from_api(&self.config.org, e))?;

        Progress::RepositoriesListed {
            count: inventory.repositories_listed,
        }
        .emit(mode);
        for skipped in &inventory.skipped {
            Progress::RepositorySkipped {
                repository: skipped.repository.clone(),
                reason: skipped.reason.to_string(),
                detail: skipped.detail.clone(),
            }
            .emit(mode);
        }

        if let Some(err) = fatal_failure(&inventory) {
            return Err(ScanError::from_api(&self.config.org, err));
        }

        self.transition(ScanState::Filtering);
        let candidates = filter_candidates(
            &inventory,
            &StalenessCriteria {
                threshold_months: self.config.months,
                filter: &self.config.itaps,
                policy: &self.config.branch_policy,
                now: self.now,
            },
        );
        info!(
            "{} stale branches across {} scanned repositories ({} branches inspected)",
            candidates.len(),
            inventory.repositories.len(),
            inventory.branch_count()
        );

        let report = ScanReport {
            metadata: self.metadata(&inventory),
            candidates,
        };

        if inventory.timed_out {
            Progress::TimedOut {
                after_secs: self.config.timeout.as_secs(),
            }
            .emit(mode);
        }
        Progress::ScanFinished {
            candidates: report.candidates.len(),
            scanned: report.metadata.repositories_scanned,
            skipped: report.metadata.skipped_count(),
            out_of_scope: report.metadata.repositories_out_of_scope,
            api_errors: report.metadata.api_errors,
            elapsed_secs: started.elapsed().as_secs(),
        }
        .emit(mode);

        self.transition(ScanState::Rendering);
        let files = write_reports(&self.config.out_dir, &report)?;
        Progress::ReportWritten {
            html: files.html.display().to_string(),
            csv: files.csv.as_ref().map(|p| p.display().to_string()),
        }
        .emit(mode);

        self.transition(ScanState::Done);
        let exit = if inventory.timed_out {
            ExitStatus::Timeout
        } else {
            ExitStatus::Success
        };
        Ok(ScanOutcome {
            report,
            files,
            exit,
        })
    }

    fn metadata(&self, inventory: &Inventory) -> RunMetadata {
        let policy = &self.config.branch_policy;
        RunMetadata {
            org: self.config.org.clone(),
            threshold_months: self.config.months,
            requested_itaps: self.config.itaps.iter().map(str::to_string).collect(),
            started_at: self.now,
            finished_at: Utc::now(),
            repositories_listed: inventory.repositories_listed,
            repositories_scanned: inventory.completed(),
            repositories_out_of_scope: inventory.out_of_scope,
            skipped: inventory.skipped.clone(),
            branch_warnings: inventory.branch_warnings.clone(),
            api_errors: inventory.api_errors,
            exclude_protected: policy.excludes_protected(),
            exclude_default: policy.excludes_default(),
            excluded_patterns: policy.patterns().map(str::to_string).collect(),
            timed_out: inventory.timed_out,
        }
    }

    fn transition(&mut self, next: ScanState) {
        debug!("scan state {:?} -> {next:?}", self.state);
        self.state = next;
    }
}

/// An organization-wide failure that left no repository scanned
fn fatal_failure(inventory: &Inventory) -> Option<ApiError> {
    if inventory.completed() > 0 {
        return None;
    }
    inventory.fatal.clone()
}
