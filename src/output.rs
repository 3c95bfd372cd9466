//! Progress output for CI logs
//!
//! Progress goes to stdout as one line per event, either human-readable
//! (`[INFO] scan_started org=acme ...`) or as JSON lines for log processors.
//! Diagnostics go through `log` to stderr and are not part of this contract.

use serde::Serialize;

/// Output mode for progress lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output (machine-readable), one object per line
    Json,
}

/// A progress event emitted during a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Progress {
    /// Validation passed; about to contact GitHub
    ScanStarted {
        /// Organization login
        org: String,
        /// Requested ITAP ids, comma-joined
        itaps: String,
        /// Threshold in calendar months
        months: u32,
    },
    /// Organization listing finished
    RepositoriesListed {
        /// Distinct repositories
        count: usize,
    },
    /// A repository failed and was left out
    RepositorySkipped {
        /// `owner/name`
        repository: String,
        /// Reason category
        reason: String,
        /// Error detail
        detail: String,
    },
    /// Inventory and filtering finished
    ScanFinished {
        /// Stale candidates found
        candidates: usize,
        /// Repositories fully scanned
        scanned: usize,
        /// Repositories skipped on errors
        skipped: usize,
        /// Repositories without a requested ITAP id
        out_of_scope: usize,
        /// API errors recovered from
        api_errors: usize,
        /// Wall-clock duration in seconds
        elapsed_secs: u64,
    },
    /// The wall-clock budget ran out; a partial report follows
    TimedOut {
        /// Budget in seconds
        after_secs: u64,
    },
    /// Report files written
    ReportWritten {
        /// HTML report path
        html: String,
        /// CSV path, absent when there were no candidates
        csv: Option<String>,
    },
}

impl Progress {
    /// Render the event as a single line
    #[must_use]
    pub fn line(&self, mode: OutputMode) -> String {
        match mode {
            OutputMode::Human => self.human_line(),
            OutputMode::Json => serde_json::to_string(self).unwrap_or_default(),
        }
    }

    /// Print the event to stdout
    pub fn emit(&self, mode: OutputMode) {
        println!("{}", self.line(mode));
    }

    fn human_line(&self) -> String {
        match self {
            Self::ScanStarted { org, itaps, months } => {
                format!("[INFO] scan_started org={org} itaps={itaps} months={months}")
            },
            Self::RepositoriesListed { count } => {
                format!("[INFO] repositories_listed count={count}")
            },
            Self::RepositorySkipped {
                repository,
                reason,
                detail,
            } => format!("[WARN] repository_skipped repository={repository} reason={reason} detail={detail:?}"),
            Self::ScanFinished {
                candidates,
                scanned,
                skipped,
                out_of_scope,
                api_errors,
                elapsed_secs,
            } => format!(
                "[INFO] scan_finished candidates={candidates} scanned={scanned} skipped={skipped} \
                 out_of_scope={out_of_scope} api_errors={api_errors} elapsed_secs={elapsed_secs}"
            ),
            Self::TimedOut { after_secs } => {
                format!("[WARN] timed_out after_secs={after_secs} partial=true")
            },
            Self::ReportWritten { html, csv } => format!(
                "[INFO] report_written html={html} csv={}",
                csv.as_deref().unwrap_or("none")
            ),
        }
    }
}
