//! Collector configuration.

use crate::{CollectorError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Configuration for a [`Collector`](crate::Collector).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Path of the fail2ban control socket.
    #[serde(default = "default_socket_path")]
    pub socket_path: PathBuf,

    /// Treat a failed socket dial as fatal.
    #[serde(default)]
    pub exit_on_socket_conn_error: bool,

    /// Also export each jail's ban time, find time and max retries.
    #[serde(default)]
    pub jail_config_metrics: bool,

    /// GeoIP enrichment of banned addresses; disabled when absent.
    #[serde(default)]
    pub geoip: Option<GeoIpConfig>,
}

/// Location of the GeoIP lookup service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoIpConfig {
    /// Lookup endpoint, called with a form POST.
    pub url: String,

    /// Request timeout (seconds).
    #[serde(default = "default_geoip_timeout")]
    pub timeout_secs: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            exit_on_socket_conn_error: false,
            jail_config_metrics: false,
            geoip: None,
        }
    }
}

impl GeoIpConfig {
    /// Lookup endpoint with the default timeout
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_secs: default_geoip_timeout(),
        }
    }

    /// Request timeout
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl CollectorConfig {
    /// Load config from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            content.parse()
        } else {
            Ok(Self::default())
        }
    }

    /// Reject settings that cannot work.
    pub fn validate(&self) -> Result<()> {
        if self.socket_path.as_os_str().is_empty() {
            return Err(CollectorError::Config("socket_path is empty".to_string()));
        }
        if let Some(geoip) = &self.geoip {
            Url::parse(&geoip.url).map_err(|e| {
                CollectorError::Config(format!("invalid geoip url {:?}: {e}", geoip.url))
            })?;
            if geoip.timeout_secs == 0 {
                return Err(CollectorError::Config(
                    "geoip timeout_secs must be positive".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl std::str::FromStr for CollectorConfig {
    type Err = CollectorError;

    fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| CollectorError::Config(e.to_string()))
    }
}

// Default value functions for serde.
fn default_socket_path() -> PathBuf {
    PathBuf::from("/var/run/fail2ban/fail2ban.sock")
}

const fn default_geoip_timeout() -> u64 {
    10
}
