//! `f2b-exporter jails` - counters and settings of every jail.

use anyhow::Result;
use f2b_collector::CollectorConfig;
use std::process::ExitCode;
use tabled::{Table, Tabled};

use super::connect;

#[derive(Tabled)]
struct JailRow {
    #[tabled(rename = "Jail")]
    name: String,
    #[tabled(rename = "Failed")]
    failed: String,
    #[tabled(rename = "Banned")]
    banned: String,
    #[tabled(rename = "Ban time")]
    ban_time: i64,
    #[tabled(rename = "Find time")]
    find_time: i64,
    #[tabled(rename = "Max retries")]
    max_retries: i64,
}

pub async fn execute(config: CollectorConfig) -> Result<ExitCode> {
    let mut socket = connect(&config).await?;

    let mut rows = Vec::new();
    for name in socket.jails().await? {
        let mut jail = socket.jail(&name);
        let stats = jail.stats().await?;
        let row = JailRow {
            name: name.clone(),
            failed: format!("{} / {}", stats.failed_current, stats.failed_total),
            banned: format!("{} / {}", stats.banned_current, stats.banned_total),
            ban_time: jail.ban_time().await?,
            find_time: jail.find_time().await?,
            max_retries: jail.max_retries().await?,
        };
        rows.push(row);
    }
    socket.close().await;

    if rows.is_empty() {
        println!("No jails configured");
    } else {
        println!("{}", Table::new(rows));
    }
    Ok(ExitCode::SUCCESS)
}
