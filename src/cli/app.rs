//! CLI definitions and entry point

use std::path::PathBuf;

use clap::Parser;

use super::scan;
use crate::config::Environment;
use crate::error::ExitStatus;

/// stale-scan - Stale GitHub branch audit filtered by ITAP application ids
#[derive(Parser, Debug)]
#[command(
    name = "stale-scan",
    version,
    about = "Report stale GitHub branches for the requested ITAP application ids",
    long_about = "Scan every repository of a GitHub organization, keep the ones tagged with a \
                  requested ITAP id, and report branches whose last commit is at least \
                  --months calendar months old.\n\n\
                  Writes email.html (always) and stale_report.csv (only when a stale branch \
                  was found) into --out. The token is read from GITHUB_TOKEN.\n\n\
                  Exit codes: 0 success, 1 invalid input, 2 GitHub or report failure, \
                  3 time budget exhausted (partial report written)."
)]
pub struct Cli {
    /// GitHub organization login
    #[arg(long)]
    pub org: String,

    /// Comma-separated ITAP ids, e.g. APM0014540,APM0099999
    #[arg(long)]
    pub itaps: String,

    /// Minimum inactivity in calendar months (positive integer)
    #[arg(long, allow_hyphen_values = true)]
    pub months: String,

    /// Output directory for stale_report.csv and email.html (created if absent)
    #[arg(long)]
    pub out: PathBuf,

    /// Optional TOML settings file
    #[arg(long, env = "STALE_SCAN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Repositories scanned concurrently
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Overall time budget in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// GitHub API root (for GitHub Enterprise Server)
    #[arg(long)]
    pub api_url: Option<String>,

    /// Leave protected branches out of the report
    #[arg(long)]
    pub exclude_protected: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Output progress as JSON lines (machine-readable)
    #[arg(long)]
    pub json: bool,
}

/// Run the CLI and return the process exit status
pub fn run() -> ExitStatus {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version are reported as errors by clap but are not failures
            let status = if e.use_stderr() {
                ExitStatus::Validation
            } else {
                ExitStatus::Success
            };
            let _ = e.print();
            return status;
        },
    };

    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    match scan::execute(&cli, &Environment::from_process()) {
        Ok(status) => status,
        Err(e) => {
            eprintln!("error: {e}");
            e.exit_status()
        },
    }
}
