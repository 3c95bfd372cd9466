//! CSV rendering
//!
//! RFC 4180 quoting with `\n` line endings. A field is quoted when it
//! contains a comma, a double quote or a line break; embedded quotes are
//! doubled.

use std::fmt::Write;

use super::format_timestamp;
use crate::core::models::StaleCandidate;

/// Header row, in column order
pub const CSV_HEADER: &str = "repository,branch,itap_ids,last_activity_utc,age_months";

/// Render candidates as CSV, header included
///
/// Rows follow the order of `candidates`; callers pass them sorted.
/// `itap_ids` holds the matched ids joined with `;`.
#[must_use]
pub fn render_csv(candidates: &[StaleCandidate]) -> String {
    let mut out = String::with_capacity(64 * (candidates.len() + 1));
    out.push_str(CSV_HEADER);
    out.push('\n');

    for c in candidates {
        let _ = writeln!(
            out,
            "{},{},{},{},{}",
            escape(&c.repository),
            escape(&c.branch),
            escape(&c.itap_ids.join(";")),
            format_timestamp(&c.last_activity),
            c.age_months
        );
    }
    out
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
