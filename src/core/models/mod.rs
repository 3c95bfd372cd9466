//! Domain models for stale-scan
//!
//! Plain data produced once per scan and never mutated afterwards.
//!
//! - [`RepoListing`] / [`Repository`] - a repository before and after ITAP association
//! - [`BranchRef`] / [`Branch`] - a branch before and after last-commit resolution
//! - [`ItapFilter`] - the normalized set of requested ITAP ids
//! - [`StaleCandidate`] - a branch that qualified as stale
//! - [`ScanReport`] - ordered candidates plus run metadata

mod branch;
mod candidate;
mod itap;
mod report;
mod repository;

pub use branch::{Branch, BranchPolicy, BranchRef, CommitInfo};
pub use candidate::StaleCandidate;
pub use itap::{ItapExtractor, ItapFilter, normalize_itap};
pub use report::{BranchWarning, RunMetadata, ScanReport, SkipReason, SkippedRepository};
pub use repository::{RepoListing, Repository};
