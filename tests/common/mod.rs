//! Common test utilities shared across test types
//!
//! - `fixtures.rs` - Test data builders
//! - `mocks.rs` - In-memory `GitHubSource`
//! - `fake_github.rs` - tiny_http server speaking a subset of the GitHub REST API

pub mod mocks;
