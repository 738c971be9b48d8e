//! Command-line argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Prometheus exporter for the fail2ban daemon
///
/// Reads jail counters over the fail2ban control socket. Flags override the
/// values from the config file.
#[derive(Parser, Debug)]
#[command(name = "f2b-exporter")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (default: platform config dir)
    #[arg(short, long, env = "F2B_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Path of the fail2ban control socket
    #[arg(short, long, env = "F2B_SOCKET", global = true)]
    pub socket: Option<PathBuf>,

    /// Exit with an error when the socket cannot be opened
    #[arg(long, global = true)]
    pub strict: bool,

    /// Export ban time, find time and max retries per jail
    #[arg(long, global = true)]
    pub jail_config_metrics: bool,

    /// GeoIP lookup service for banned addresses
    #[arg(long, env = "F2B_GEOIP_URL", global = true)]
    pub geoip_url: Option<String>,

    /// Increase log verbosity
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Run one collection cycle and print the metrics
    Collect,

    /// Check that the daemon answers
    Ping,

    /// Show counters and settings of every jail
    Jails,

    /// List banned addresses (grouped by location with --geoip-url)
    Banned,
}
