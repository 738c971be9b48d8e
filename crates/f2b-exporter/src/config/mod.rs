//! Configuration file discovery and command-line overrides.

use anyhow::{Context as _, Result};
use directories::ProjectDirs;
use f2b_collector::{CollectorConfig, GeoIpConfig};
use std::path::{Path, PathBuf};

use crate::cli::args::Cli;

/// Default config file path, e.g. `~/.config/f2b-exporter/config.toml`.
pub fn default_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("org", "fail2ban", "f2b-exporter")
        .context("Could not determine config directory")?;

    Ok(dirs.config_dir().join("config.toml"))
}

/// Load the config file named on the command line (or the default one) and
/// apply flag overrides on top.
pub fn resolve(cli: &Cli) -> Result<CollectorConfig> {
    let path = match &cli.config {
        Some(path) => path.clone(),
        None => default_path()?,
    };
    let config = load(&path)?;
    let config = apply_overrides(config, cli);
    config.validate()?;
    Ok(config)
}

fn load(path: &Path) -> Result<CollectorConfig> {
    CollectorConfig::load(path).with_context(|| format!("loading {}", path.display()))
}

/// Flags win over the file.
pub fn apply_overrides(mut config: CollectorConfig, cli: &Cli) -> CollectorConfig {
    if let Some(socket) = &cli.socket {
        config.socket_path.clone_from(socket);
    }
    if cli.strict {
        config.exit_on_socket_conn_error = true;
    }
    if cli.jail_config_metrics {
        config.jail_config_metrics = true;
    }
    if let Some(url) = &cli.geoip_url {
        match &mut config.geoip {
            Some(geoip) => geoip.url.clone_from(url),
            None => config.geoip = Some(GeoIpConfig::new(url.as_str())),
        }
    }
    config
}
