//! Adapter implementations for port traits
//!
//! This module contains concrete implementations that handle I/O:
//!
//! - `github/` - GitHub REST client implementing [`crate::core::ports::GitHubSource`]

pub mod github;
