//! Report rendering and output files
//!
//! A run produces two artifacts in the output directory:
//!
//! - `email.html` - always written, the summary sent to owning teams
//! - `stale_report.csv` - written only when there is at least one candidate
//!
//! Rendering is pure and deterministic for a given [`ScanReport`]; only
//! [`write_reports`] touches the filesystem.

mod csv;
mod html;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};
use thiserror::Error;

use crate::core::models::ScanReport;

pub use self::csv::{CSV_HEADER, render_csv};
pub use self::html::render_html;

/// CSV report file name
pub const CSV_FILE: &str = "stale_report.csv";
/// HTML report file name
pub const HTML_FILE: &str = "email.html";

/// Report rendering or writing failure
#[derive(Debug, Error)]
pub enum ReportError {
    /// Output file or directory could not be written
    #[error("failed to write {}: {source}", path.display())]
    Io {
        /// Path being written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// HTML template failed to render
    #[error("failed to render HTML report: {0}")]
    Template(#[from] tinytemplate::error::Error),
}

/// Both artifacts rendered in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReport {
    /// CSV content; `None` when there are no candidates
    pub csv: Option<String>,
    /// HTML content
    pub html: String,
}

/// Paths of the files a run wrote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFiles {
    /// HTML report
    pub html: PathBuf,
    /// CSV report, absent when there were no candidates
    pub csv: Option<PathBuf>,
}

/// Render both artifacts without touching the filesystem
pub fn render(report: &ScanReport) -> Result<RenderedReport, ReportError> {
    Ok(RenderedReport {
        csv: (!report.is_empty()).then(|| render_csv(&report.candidates)),
        html: render_html(report)?,
    })
}

/// Render `report` and write it into `out_dir`
///
/// Creates `out_dir` when missing. With no candidates, a CSV left over from
/// an earlier run in the same directory is removed so the directory always
/// reflects this run.
pub fn write_reports(out_dir: &Path, report: &ScanReport) -> Result<ReportFiles, ReportError> {
    fs::create_dir_all(out_dir).map_err(|source| ReportError::Io {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let rendered = render(report)?;

    let html = out_dir.join(HTML_FILE);
    write_file(&html, &rendered.html)?;

    let csv_path = out_dir.join(CSV_FILE);
    let csv = match rendered.csv {
        Some(content) => {
            write_file(&csv_path, &content)?;
            Some(csv_path)
        },
        None => {
            match fs::remove_file(&csv_path) {
                Ok(()) => debug!("removed stale {}", csv_path.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {},
                Err(source) => {
                    return Err(ReportError::Io {
                        path: csv_path,
                        source,
                    });
                },
            }
            None
        },
    };

    info!(
        "wrote {}{}",
        html.display(),
        csv.as_ref().map(|p| format!(" and {}", p.display())).unwrap_or_default()
    );
    Ok(ReportFiles { html, csv })
}

fn write_file(path: &Path, content: &str) -> Result<(), ReportError> {
    fs::write(path, content).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Timestamp format used in both artifacts (`2024-01-31T09:15:00Z`)
pub(crate) fn format_timestamp(ts: &chrono::DateTime<chrono::Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
