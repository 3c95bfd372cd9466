//! HTML summary rendering
//!
//! The template lives next to this file and is compiled into the binary.
//! Values go through tinytemplate's default formatter, which HTML-escapes
//! them, so repository and branch names cannot inject markup.

use serde::Serialize;
use tinytemplate::TinyTemplate;

use super::{ReportError, format_timestamp};
use crate::core::models::ScanReport;

const TEMPLATE_NAME: &str = "email";
const TEMPLATE: &str = include_str!("email.html");

#[derive(Serialize)]
struct EmailContext<'a> {
    org: &'a str,
    requested_itaps: String,
    threshold_months: u32,
    generated_at: String,
    timed_out: bool,
    candidate_count: usize,
    has_candidates: bool,
    rows: Vec<Row<'a>>,
    repositories_listed: usize,
    repositories_scanned: usize,
    out_of_scope: usize,
    skipped_count: usize,
    branch_warning_count: usize,
    api_errors: usize,
    has_skipped: bool,
    skip_reasons: Vec<ReasonCount>,
    skipped: Vec<SkipRow<'a>>,
    protected_note: &'static str,
    default_note: &'static str,
    has_excluded_patterns: bool,
    excluded_patterns: String,
}

#[derive(Serialize)]
struct Row<'a> {
    repository: &'a str,
    branch: &'a str,
    itap_ids: String,
    last_activity: String,
    age_months: u32,
    author: &'a str,
}

#[derive(Serialize)]
struct ReasonCount {
    reason: &'static str,
    count: usize,
}

#[derive(Serialize)]
struct SkipRow<'a> {
    repository: &'a str,
    reason: &'static str,
    detail: &'a str,
}

/// Render the HTML summary of `report`
///
/// Always produces a complete document; with no candidates the table has
/// no rows and a notice says so.
pub fn render_html(report: &ScanReport) -> Result<String, ReportError> {
    let meta = &report.metadata;

    let rows = report
        .candidates
        .iter()
        .map(|c| Row {
            repository: &c.repository,
            branch: &c.branch,
            itap_ids: c.itap_ids.join(", "),
            last_activity: format_timestamp(&c.last_activity),
            age_months: c.age_months,
            author: c.author.as_deref().unwrap_or("unknown"),
        })
        .collect();

    let context = EmailContext {
        org: &meta.org,
        requested_itaps: meta.requested_itaps.join(", "),
        threshold_months: meta.threshold_months,
        generated_at: format_timestamp(&meta.finished_at),
        timed_out: meta.timed_out,
        candidate_count: report.candidates.len(),
        has_candidates: !report.is_empty(),
        rows,
        repositories_listed: meta.repositories_listed,
        repositories_scanned: meta.repositories_scanned,
        out_of_scope: meta.repositories_out_of_scope,
        skipped_count: meta.skipped_count(),
        branch_warning_count: meta.branch_warnings.len(),
        api_errors: meta.api_errors,
        has_skipped: !meta.skipped.is_empty(),
        skip_reasons: meta
            .skip_reasons()
            .into_iter()
            .map(|(reason, count)| ReasonCount {
                reason: reason.as_str(),
                count,
            })
            .collect(),
        skipped: meta
            .skipped
            .iter()
            .map(|s| SkipRow {
                repository: &s.repository,
                reason: s.reason.as_str(),
                detail: &s.detail,
            })
            .collect(),
        protected_note: if meta.exclude_protected {
            "Protected branches are excluded"
        } else {
            "Protected branches are included"
        },
        default_note: if meta.exclude_default {
            "Default branches are excluded"
        } else {
            "Default branches are included"
        },
        has_excluded_patterns: !meta.excluded_patterns.is_empty(),
        excluded_patterns: meta.excluded_patterns.join(", "),
    };

    let mut tt = TinyTemplate::new();
    tt.add_template(TEMPLATE_NAME, TEMPLATE)?;
    Ok(tt.render(TEMPLATE_NAME, &context)?)
}
