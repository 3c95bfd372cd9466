//! stale-scan - audit a GitHub organization for stale branches
//!
//! Enumerates every repository and branch of an organization, associates each
//! repository with ITAP application ids, keeps the branches owned by the
//! requested ids whose last commit is older than a calendar-month threshold,
//! and writes a CSV plus an HTML email report for the CI pipeline to pick up.
//!
//! Data flows strictly downward:
//!
//! ```text
//! adapters::github (GitHubSource) -> core::services::inventory
//!     -> core::services::staleness -> report
//! ```
//!
//! coordinated by [`core::services::orchestrator::Orchestrator`].

// Deny all clippy warnings in this crate
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    missing_debug_implementations,
    unsafe_code,
    unused_import_braces
)]
// Allow some pedantic lints that are too noisy or not applicable
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cargo_common_metadata,
    clippy::future_not_send
)]

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod output;
pub mod report;
