//! `f2b-exporter ping` - check that the daemon answers.

use anyhow::Result;
use colored::Colorize;
use f2b_collector::CollectorConfig;
use std::process::ExitCode;

use super::connect;

pub async fn execute(config: CollectorConfig) -> Result<ExitCode> {
    let mut socket = connect(&config).await?;
    let alive = socket.ping().await?;
    let version = socket.version().await?;
    socket.close().await;

    if alive {
        println!("{} fail2ban {version}", "pong".green().bold());
        Ok(ExitCode::SUCCESS)
    } else {
        println!("{} fail2ban {version}", "no pong".red().bold());
        Ok(ExitCode::FAILURE)
    }
}
