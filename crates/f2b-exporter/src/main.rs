//! f2b-exporter - fail2ban metrics exporter
//!
//! Reads jail statistics from the fail2ban control socket and prints them in
//! the Prometheus text format.

use anyhow::Result;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    f2b_exporter::run().await
}
