//! Link-header pagination
//!
//! GitHub paginates list endpoints with an RFC 8288 `Link` header:
//!
//! ```text
//! Link: <https://api.github.com/orgs/acme/repos?page=2>; rel="next",
//!       <https://api.github.com/orgs/acme/repos?page=9>; rel="last"
//! ```
//!
//! Following `rel="next"` works for both page-number and cursor pagination.

use reqwest::Url;
use reqwest::header::{HeaderMap, LINK};

/// URL of the next page, if the response has one
#[must_use]
pub fn next_page(headers: &HeaderMap) -> Option<Url> {
    let link = headers.get(LINK)?.to_str().ok()?;
    link.split(',').find_map(|entry| {
        let (target, params) = entry.split_once(';')?;
        let is_next = params.split(';').any(|param| {
            param
                .trim()
                .strip_prefix("rel=")
                .is_some_and(|rel| rel.trim_matches('"').split_whitespace().any(|r| r == "next"))
        });
        if !is_next {
            return None;
        }
        let target = target.trim().strip_prefix('<')?.strip_suffix('>')?;
        Url::parse(target).ok()
    })
}
