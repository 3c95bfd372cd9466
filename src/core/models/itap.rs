//! ITAP application identifiers
//!
//! An ITAP id ties a repository to the application (and team) that owns it.
//! Ids are compared case-insensitively, so everything is normalized to
//! trimmed upper case on the way in.
//!
//! # Examples
//!
//! ```
//! use stale_scan::core::models::ItapFilter;
//!
//! let filter = ItapFilter::parse(" apm0014540, APM0099999 ").unwrap();
//! assert!(filter.contains("APM0014540"));
//! assert_eq!(filter.to_string(), "APM0014540,APM0099999");
//! ```

use std::collections::BTreeSet;
use std::fmt;

use regex::{Regex, RegexBuilder};

use crate::error::ValidationError;

/// Normalize an ITAP id for comparison
#[must_use]
pub fn normalize_itap(id: &str) -> String {
    id.trim().to_uppercase()
}

/// Normalized set of requested ITAP ids
///
/// An empty filter admits every repository. [`ItapFilter::parse`] never
/// produces one: the CLI requires at least one id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItapFilter {
    ids: BTreeSet<String>,
}

impl ItapFilter {
    /// Parse a comma-separated `--itaps` value
    ///
    /// Rejects blank input and empty entries (`APM1,,APM2`, trailing commas).
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        if raw.trim().is_empty() {
            return Err(ValidationError::EmptyItapList);
        }

        let mut ids = BTreeSet::new();
        for token in raw.split(',') {
            let id = normalize_itap(token);
            if id.is_empty() {
                return Err(ValidationError::EmptyItapToken(raw.to_string()));
            }
            ids.insert(id);
        }

        Ok(Self { ids })
    }

    /// Build a filter from already-split ids, normalizing each one
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            ids: ids
                .into_iter()
                .map(|id| normalize_itap(id.as_ref()))
                .filter(|id| !id.is_empty())
                .collect(),
        }
    }

    /// Whether no ids were requested
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of requested ids
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Requested ids in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Whether `id` was requested (case-insensitive)
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(&normalize_itap(id))
    }

    /// Repository ids that were requested
    ///
    /// With an empty filter every repository id counts as matched.
    #[must_use]
    pub fn matched(&self, repo_ids: &BTreeSet<String>) -> BTreeSet<String> {
        if self.is_empty() {
            return repo_ids.clone();
        }
        repo_ids.iter().filter(|id| self.contains(id)).cloned().collect()
    }

    /// Whether a repository carrying `repo_ids` is in scope
    #[must_use]
    pub fn admits(&self, repo_ids: &BTreeSet<String>) -> bool {
        self.is_empty() || repo_ids.iter().any(|id| self.contains(id))
    }

    /// Requested ids that occur anywhere in a repository name
    pub fn found_in<'a>(&'a self, repo_name: &str) -> impl Iterator<Item = &'a str> {
        let upper = repo_name.to_uppercase();
        self.ids.iter().filter(move |id| upper.contains(id.as_str())).map(String::as_str)
    }
}

impl fmt::Display for ItapFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.iter().collect();
        write!(f, "{}", joined.join(","))
    }
}

/// Finds ITAP ids embedded in free text (repository names, topics, descriptions)
#[derive(Debug, Clone)]
pub struct ItapExtractor {
    pattern: Regex,
}

impl ItapExtractor {
    /// Pattern used when the config file does not override it
    pub const DEFAULT_PATTERN: &'static str = r"APM\d{7}";

    /// Compile a case-insensitive extractor
    pub fn new(pattern: &str) -> Result<Self, ValidationError> {
        let pattern = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| ValidationError::InvalidItapPattern {
                pattern: pattern.to_string(),
                source,
            })?;
        Ok(Self { pattern })
    }

    /// All normalized ids found in `text`
    pub fn extract<'a>(&'a self, text: &'a str) -> impl Iterator<Item = String> + 'a {
        self.pattern.find_iter(text).map(|m| normalize_itap(m.as_str()))
    }
}
