//! Business logic services
//!
//! - [`inventory`] - Walk an organization into repositories and branches
//! - [`staleness`] - Select stale branches of in-scope repositories (pure)
//! - [`orchestrator`] - Drive a run from config to report files

pub mod inventory;
pub mod orchestrator;
pub mod staleness;

pub use inventory::{Inventory, InventoryOptions, RepositoryInventory, build_inventory, listed_itap_ids};
pub use orchestrator::{Orchestrator, ScanOutcome, ScanState};
pub use staleness::{StalenessCriteria, filter_candidates, months_between};
