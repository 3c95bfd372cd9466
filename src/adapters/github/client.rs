//! reqwest-backed GitHub REST client
//!
//! Every request goes through [`GitHubClient::get_json`], which:
//!
//! 1. waits on the shared [`RateLimiter`]
//! 2. retries network errors and 5xx with exponential backoff
//! 3. suspends all workers on a rate-limit response and repeats the request
//! 4. maps the remaining failures onto [`ApiError`] without retrying

use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use tokio::time::sleep;

use super::pagination;
use super::rate_limit::{RateLimiter, rate_limit_wait};
use super::retry::{BackoffPolicy, RetryPolicy};
use super::types::{BranchDto, CommitDto, ErrorBody, PropertyValueDto, RepoDto, property_values};
use crate::config::AccessToken;
use crate::core::models::{BranchRef, CommitInfo, RepoListing};
use crate::core::ports::GitHubSource;
use crate::error::ApiError;

/// User agent sent with every request
pub static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

const GITHUB_JSON: &str = "application/vnd.github+json";
const API_VERSION_HEADER: &str = "x-github-api-version";
const API_VERSION: &str = "2022-11-28";

/// Longest response excerpt carried in an error
const EXCERPT_LEN: usize = 200;

/// Connection settings for [`GitHubClient`]
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// API root, e.g. `https://api.github.com` or `https://ghe.example/api/v3`
    pub api_url: Url,
    /// Access token
    pub token: AccessToken,
    /// Items per page for list endpoints
    pub per_page: u32,
    /// Timeout for a single HTTP request
    pub request_timeout: Duration,
    /// Retry and rate-limit bounds
    pub retry: RetryPolicy,
    /// Custom property holding ITAP ids; `None` skips the lookup
    pub itap_property: Option<String>,
}

/// GitHub API client shared by all scan workers
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    base: Url,
    token: AccessToken,
    per_page: String,
    retry: RetryPolicy,
    limiter: Arc<RateLimiter>,
    itap_property: Option<String>,
}

impl GitHubClient {
    /// Build a client with its own rate limiter
    pub fn new(options: ClientOptions) -> reqwest::Result<Self> {
        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(options.request_timeout)
            .build()?;

        Ok(Self {
            http,
            base: options.api_url,
            token: options.token,
            per_page: options.per_page.to_string(),
            retry: options.retry,
            limiter: Arc::new(RateLimiter::new()),
            itap_property: options.itap_property,
        })
    }

    /// The limiter all requests of this client consult
    #[must_use]
    pub const fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Lazily walk a paginated list endpoint
    #[must_use]
    pub fn pages<T>(&self, first: Url) -> Pages<'_, T> {
        Pages {
            client: self,
            next: Some(first),
            seen: HashSet::new(),
            _item: PhantomData,
        }
    }

    fn endpoint(&self, segments: &[&str], paged: bool) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::Decode {
                url: self.base.to_string(),
                message: "API URL cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        if paged {
            url.query_pairs_mut().append_pair("per_page", &self.per_page);
        }
        Ok(url)
    }

    async fn collect_pages<T>(&self, first: Url) -> Result<Vec<T>, ApiError>
    where
        T: DeserializeOwned + Send,
    {
        let mut pages = self.pages(first);
        let mut items = Vec::new();
        while let Some(page) = pages.next_page().await? {
            items.extend(page);
        }
        Ok(items)
    }

    /// GET `url` and decode the body, returning the next-page link if any
    pub async fn get_json<T>(&self, url: &Url) -> Result<(T, Option<Url>), ApiError>
    where
        T: DeserializeOwned + Send,
    {
        let mut failures = 0_u32;
        let mut rate_limit_waits = 0_u32;

        loop {
            self.limiter.wait_ready().await;
            debug!("GET {url}");

            let sent = self
                .http
                .get(url.clone())
                .bearer_auth(self.token.expose())
                .header(ACCEPT, GITHUB_JSON)
                .header(API_VERSION_HEADER, API_VERSION)
                .send()
                .await;

            let response = match sent {
                Ok(response) => response,
                Err(e) => {
                    failures += 1;
                    self.back_off(url, failures, &e.to_string()).await?;
                    continue;
                },
            };

            let status = response.status();
            let headers = response.headers().clone();
            self.limiter.observe(&headers);

            if status.is_success() {
                let next = pagination::next_page(&headers);
                let body = match response.text().await {
                    Ok(body) => body,
                    Err(e) => {
                        failures += 1;
                        self.back_off(url, failures, &e.to_string()).await?;
                        continue;
                    },
                };
                let value = serde_json::from_str(&body).map_err(|e| ApiError::Decode {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
                return Ok((value, next));
            }

            let body = response.text().await.unwrap_or_default();

            if let Some(wait) = rate_limit_wait(status, &headers, &body) {
                if rate_limit_waits >= self.retry.rate_limit_retries {
                    return Err(ApiError::RateLimitExceeded {
                        url: url.to_string(),
                        attempts: rate_limit_waits,
                    });
                }
                rate_limit_waits += 1;
                warn!(
                    "rate limit hit on {url}; suspending requests for {:.1}s (wait {rate_limit_waits}/{})",
                    wait.as_secs_f64(),
                    self.retry.rate_limit_retries
                );
                self.limiter.suspend_for(wait);
                continue;
            }

            if status.is_server_error() {
                failures += 1;
                self.back_off(url, failures, &format!("{status}: {}", excerpt(&body))).await?;
                continue;
            }

            return Err(classify(status, url, &body));
        }
    }

    /// Sleep before the next attempt, or give up once attempts are exhausted
    async fn back_off(&self, url: &Url, failures: u32, reason: &str) -> Result<(), ApiError> {
        if failures >= self.retry.max_attempts {
            warn!("giving up on {url} after {failures} attempts: {reason}");
            return Err(ApiError::ResourceUnavailable {
                status: None,
                url: url.to_string(),
                message: format!("{reason} (after {failures} attempts)"),
            });
        }
        let delay = self.retry.delay_for_attempt(failures);
        warn!("request to {url} failed (attempt {failures}): {reason}; retrying in {delay:?}");
        sleep(delay).await;
        Ok(())
    }
}

/// Non-retryable failure for a non-success, non-rate-limit response
fn classify(status: StatusCode, url: &Url, body: &str) -> ApiError {
    let message = excerpt(body);
    if status == StatusCode::UNAUTHORIZED {
        ApiError::AuthenticationFailed {
            status: status.as_u16(),
            url: url.to_string(),
            message,
        }
    } else {
        ApiError::ResourceUnavailable {
            status: Some(status.as_u16()),
            url: url.to_string(),
            message,
        }
    }
}

/// GitHub's `message` field, or the start of the raw body
fn excerpt(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body).map_or_else(
        |_| body.trim().chars().take(EXCERPT_LEN).collect(),
        |error| error.message,
    )
}

/// Lazy page-by-page walk over a list endpoint
///
/// Restartable only by asking the client for a new walk.
#[derive(Debug)]
pub struct Pages<'c, T> {
    client: &'c GitHubClient,
    next: Option<Url>,
    seen: HashSet<Url>,
    _item: PhantomData<fn() -> T>,
}

impl<T> Pages<'_, T>
where
    T: DeserializeOwned + Send,
{
    /// Fetch the next page; `None` once the listing is exhausted
    pub async fn next_page(&mut self) -> Result<Option<Vec<T>>, ApiError> {
        let Some(url) = self.next.take() else {
            return Ok(None);
        };
        if !self.seen.insert(url.clone()) {
            warn!("pagination loop detected at {url}; stopping");
            return Ok(None);
        }

        let (items, next): (Vec<T>, _) = self.client.get_json(&url).await?;
        if items.is_empty() {
            return Ok(None);
        }
        self.next = next;
        Ok(Some(items))
    }
}

impl GitHubSource for GitHubClient {
    async fn list_repositories(&self, org: &str) -> Result<Vec<RepoListing>, ApiError> {
        let mut url = self.endpoint(&["orgs", org, "repos"], true)?;
        url.query_pairs_mut().append_pair("type", "all");
        let repos: Vec<RepoDto> = self.collect_pages(url).await?;
        Ok(repos.into_iter().map(|r| r.into_listing(org)).collect())
    }

    async fn list_branches(&self, repo: &RepoListing) -> Result<Vec<BranchRef>, ApiError> {
        let url = self.endpoint(&["repos", &repo.owner, &repo.name, "branches"], true)?;
        let branches: Vec<BranchDto> = self.collect_pages(url).await?;
        Ok(branches.into_iter().map(BranchRef::from).collect())
    }

    async fn itap_metadata(&self, repo: &RepoListing) -> Result<Vec<String>, ApiError> {
        let Some(property) = self.itap_property.as_deref() else {
            return Ok(Vec::new());
        };
        let url = self.endpoint(&["repos", &repo.owner, &repo.name, "properties", "values"], false)?;
        match self.get_json::<Vec<PropertyValueDto>>(&url).await {
            Ok((properties, _)) => Ok(property_values(properties, property)),
            // Custom properties not enabled for this org/repository
            Err(ApiError::ResourceUnavailable {
                status: Some(404), ..
            }) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    async fn last_commit(
        &self,
        repo: &RepoListing,
        branch: &BranchRef,
    ) -> Result<Option<CommitInfo>, ApiError> {
        let url =
            self.endpoint(&["repos", &repo.owner, &repo.name, "commits", &branch.commit_sha], false)?;
        let (commit, _): (CommitDto, _) = self.get_json(&url).await?;
        Ok(commit.into_info())
    }
}
