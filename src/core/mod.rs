//! Core domain logic for stale-scan
//!
//! Business logic depends only on the [`ports::GitHubSource`] trait, never on
//! the HTTP adapter, so every service can be driven by an in-memory source.
//!
//! ## Architecture
//!
//! - `models/` - Domain types (Repository, Branch, ItapFilter, StaleCandidate, ScanReport)
//! - `ports/` - Trait definitions for the GitHub API seam
//! - `services/` - Inventory builder, staleness filter, scan orchestrator

pub mod models;
pub mod ports;
pub mod services;
