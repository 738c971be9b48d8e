//! `f2b-exporter collect` - one collection cycle.

use anyhow::Result;
use f2b_collector::{render, Collector, CollectorConfig, CycleOutcome};
use std::process::ExitCode;
use tracing::error;

pub async fn execute(config: CollectorConfig) -> Result<ExitCode> {
    let collector = Collector::new(config)?;
    let cycle = collector.collect().await;

    if cycle.outcome == CycleOutcome::Fatal {
        error!("socket connection failed and exit_on_socket_conn_error is set");
        return Ok(ExitCode::FAILURE);
    }

    print!("{}", render(&cycle.samples)?);
    Ok(ExitCode::SUCCESS)
}
