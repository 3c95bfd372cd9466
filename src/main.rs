//! stale-scan - audit a GitHub organization for stale branches
//!
//! Thin binary wrapper: all behaviour lives in the library, this only turns
//! the scan outcome into a process exit code.

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    unsafe_code,
    unused_import_braces
)]

use std::process::ExitCode;

/// Main entry point for the stale-scan CLI
fn main() -> ExitCode {
    ExitCode::from(stale_scan::cli::run().code())
}
