//! Organization-wide rate-limit gate
//!
//! GitHub's budget belongs to the token, not to a worker, so a single
//! [`RateLimiter`] is shared by every request the client issues. When the
//! budget runs out the limiter is closed until the reset time and every
//! worker sleeps in [`RateLimiter::wait_ready`] instead of spinning.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::warn;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use tokio::time::{Instant, sleep_until};

/// Remaining requests in the current window
pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";
/// Epoch second at which the window resets
pub const RESET_HEADER: &str = "x-ratelimit-reset";
/// Seconds to wait (secondary rate limits)
pub const RETRY_AFTER_HEADER: &str = "retry-after";

/// Wait used when GitHub signals a limit without saying for how long
const DEFAULT_WAIT: Duration = Duration::from_secs(60);
/// Never retry sooner than this after a rate-limit response
const MIN_WAIT: Duration = Duration::from_secs(1);

/// Shared gate consulted before every request
#[derive(Debug, Default)]
pub struct RateLimiter {
    resume_at: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// An open gate
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep until the gate is open
    pub async fn wait_ready(&self) {
        loop {
            match self.resume_at() {
                Some(until) if until > Instant::now() => sleep_until(until).await,
                _ => return,
            }
        }
    }

    /// Close the gate for `wait`, keeping any later resume time already set
    pub fn suspend_for(&self, wait: Duration) -> Instant {
        let until = Instant::now() + wait;
        let mut resume_at = self.resume_at.lock().unwrap_or_else(PoisonError::into_inner);
        let until = resume_at.map_or(until, |current| current.max(until));
        *resume_at = Some(until);
        until
    }

    /// Whether requests are currently held back
    #[must_use]
    pub fn is_suspended(&self) -> bool {
        self.resume_at().is_some_and(|until| until > Instant::now())
    }

    /// Close the gate ahead of time when a successful response reports an
    /// exhausted budget; returns the wait applied
    pub fn observe(&self, headers: &HeaderMap) -> Option<Duration> {
        if header_u64(headers, REMAINING_HEADER) != Some(0) {
            return None;
        }
        let wait = reset_wait(headers)?;
        if !wait.is_zero() {
            warn!("rate-limit budget exhausted; holding requests for {}s", wait.as_secs());
            self.suspend_for(wait);
        }
        Some(wait)
    }

    fn resume_at(&self) -> Option<Instant> {
        *self.resume_at.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// How long to wait if a failed response is a rate-limit signal
///
/// A 429 is always a rate limit. A 403 is one only when it carries
/// `retry-after`, an exhausted `x-ratelimit-remaining`, or says so in the
/// body; otherwise it is a plain access denial.
#[must_use]
pub fn rate_limit_wait(status: StatusCode, headers: &HeaderMap, body: &str) -> Option<Duration> {
    let retry_after = header_u64(headers, RETRY_AFTER_HEADER);
    match status {
        StatusCode::TOO_MANY_REQUESTS => {},
        StatusCode::FORBIDDEN => {
            let exhausted = header_u64(headers, REMAINING_HEADER) == Some(0);
            let mentioned = body.to_lowercase().contains("rate limit");
            if retry_after.is_none() && !exhausted && !mentioned {
                return None;
            }
        },
        _ => return None,
    }

    let wait = retry_after
        .map(Duration::from_secs)
        .or_else(|| reset_wait(headers))
        .unwrap_or(DEFAULT_WAIT);
    Some(wait.max(MIN_WAIT))
}

/// Time until the `x-ratelimit-reset` epoch second
fn reset_wait(headers: &HeaderMap) -> Option<Duration> {
    let reset = Duration::from_secs(header_u64(headers, RESET_HEADER)?);
    let now = SystemTime::now().duration_since(UNIX_EPOCH).ok()?;
    Some(reset.saturating_sub(now))
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}
