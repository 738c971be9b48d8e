//! Collection cycle for the fail2ban exporter.
//!
//! A [`Collector`] opens one connection to the daemon per [`collect`]
//! call, queries every jail, and returns the resulting [`Sample`]s along
//! with a [`CycleOutcome`] the caller acts on. [`render`] turns samples into
//! the Prometheus text exposition format.
//!
//! [`collect`]: Collector::collect

mod collector;
pub mod config;
mod error;
pub mod sample;

pub use collector::{Collector, Cycle, CycleOutcome, ErrorCounters};
pub use config::{CollectorConfig, GeoIpConfig};
pub use error::CollectorError;
pub use sample::{render, MetricDesc, MetricType, Sample};

/// Result type for collector operations.
pub type Result<T> = std::result::Result<T, CollectorError>;
