//! GitHub REST adapter
//!
//! Implements [`GitHubSource`](crate::core::ports::GitHubSource) over the
//! GitHub REST API with reqwest. Everything GitHub-specific lives here:
//! endpoints, wire types, Link pagination, retry and rate-limit handling.
//!
//! - `client` - [`GitHubClient`] and its request loop
//! - `pagination` - `Link: rel="next"` parsing
//! - `rate_limit` - the shared [`RateLimiter`] gate
//! - `retry` - [`RetryPolicy`] backoff schedule
//! - `types` - response DTOs

mod client;
pub mod pagination;
pub mod rate_limit;
pub mod retry;
pub mod types;

pub use client::{APP_USER_AGENT, ClientOptions, GitHubClient, Pages};
pub use rate_limit::RateLimiter;
pub use retry::{BackoffPolicy, RetryPolicy};
