//! Error types for the collector.

use thiserror::Error;

/// Errors raised while setting up a collector or rendering its samples.
///
/// Failures during a cycle are never returned; they are counted, logged
/// and reflected in the [`CycleOutcome`](crate::CycleOutcome).
#[derive(Error, Debug)]
pub enum CollectorError {
    /// Configuration is invalid.
    #[error("config error: {0}")]
    Config(String),

    /// Configuration file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// GeoIP client could not be built.
    #[error("geoip error: {0}")]
    GeoIp(#[from] f2b_client::GeoIpError),

    /// Samples could not be registered or encoded.
    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}
