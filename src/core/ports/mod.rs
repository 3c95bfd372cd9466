//! Port traits (interfaces) for external dependencies
//!
//! The core services talk to GitHub only through [`GitHubSource`].
//! The HTTP implementation lives in `adapters::github`; tests drive the
//! services with an in-memory implementation.

mod github;

pub use github::GitHubSource;
