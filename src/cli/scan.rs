//! The scan command: config resolution, runtime, orchestrator

use std::sync::Arc;

use chrono::Utc;
use log::debug;

use super::app::Cli;
use crate::adapters::github::GitHubClient;
use crate::config::{Environment, ScanConfig};
use crate::core::services::Orchestrator;
use crate::error::{ExitStatus, ScanError};

/// Resolve configuration and run one scan to completion
///
/// Validation happens before the runtime starts, so invalid input never
/// reaches the network.
pub fn execute(cli: &Cli, env: &Environment) -> Result<ExitStatus, ScanError> {
    let started = Utc::now();
    let config = ScanConfig::resolve(cli, env)?;
    debug!(
        "scanning {} for {} (threshold {} months, concurrency {}, budget {:?})",
        config.org, config.itaps, config.months, config.concurrency, config.timeout
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(ScanError::Runtime)?;

    let outcome = runtime.block_on(async move {
        let client = GitHubClient::new(config.client.clone()).map_err(ScanError::Client)?;
        let mut orchestrator = Orchestrator::new(config, Arc::new(client)).with_now(started);
        orchestrator.run().await
    })?;

    Ok(outcome.exit)
}
