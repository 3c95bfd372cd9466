//! CLI layer for stale-scan
//!
//! - [`app`] - CLI definitions and entry point
//! - [`scan`] - The scan command

pub mod app;
pub mod scan;

pub use app::{Cli, run};
