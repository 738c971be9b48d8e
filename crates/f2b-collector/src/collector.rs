//! One collection cycle against the fail2ban daemon.

use crate::config::CollectorConfig;
use crate::sample::{self, Sample};
use crate::Result;
use f2b_client::{Fail2BanError, Fail2BanSocket, GeoIpClient};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Version reported in the `exporter_version` label
const EXPORTER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// How a cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Every command succeeded
    Ok,
    /// The daemon was unreachable or some commands failed
    Degraded,
    /// The daemon was unreachable and the config makes that fatal
    Fatal,
}

/// Samples produced by one cycle, and how it ended
#[derive(Debug, Clone)]
pub struct Cycle {
    /// Samples to expose
    pub samples: Vec<Sample>,
    /// Outcome the caller should act on
    pub outcome: CycleOutcome,
}

/// Error counters kept for the lifetime of the process
#[derive(Debug, Default)]
pub struct ErrorCounters {
    socket_conn: AtomicU64,
    socket_req: AtomicU64,
}

impl ErrorCounters {
    /// Failed socket dials
    pub fn socket_conn(&self) -> u64 {
        self.socket_conn.load(Ordering::Relaxed)
    }

    /// Failed commands
    pub fn socket_req(&self) -> u64 {
        self.socket_req.load(Ordering::Relaxed)
    }
}

/// Runs collection cycles.
///
/// Cloning is cheap; clones share the error counters, so concurrent
/// scrapes each count into the same totals.
#[derive(Clone, Debug)]
pub struct Collector {
    inner: Arc<CollectorInner>,
}

#[derive(Debug)]
struct CollectorInner {
    config: CollectorConfig,
    geoip: Option<GeoIpClient>,
    errors: ErrorCounters,
}

impl Collector {
    /// Validate `config` and build a collector from it.
    pub fn new(config: CollectorConfig) -> Result<Self> {
        config.validate()?;

        let geoip = match &config.geoip {
            Some(geoip) => Some(
                GeoIpClient::builder(geoip.url.as_str())
                    .timeout(geoip.timeout())
                    .build()?,
            ),
            None => None,
        };

        info!(
            socket = %config.socket_path.display(),
            geoip = geoip.is_some(),
            "reading metrics from fail2ban socket"
        );

        Ok(Self {
            inner: Arc::new(CollectorInner {
                config,
                geoip,
                errors: ErrorCounters::default(),
            }),
        })
    }

    /// Configuration in use
    #[must_use]
    pub fn config(&self) -> &CollectorConfig {
        &self.inner.config
    }

    /// Error counters shared by every clone
    #[must_use]
    pub fn errors(&self) -> &ErrorCounters {
        &self.inner.errors
    }

    /// Run one cycle: connect, query, close.
    pub async fn collect(&self) -> Cycle {
        let config = &self.inner.config;

        let socket = match Fail2BanSocket::connect(&config.socket_path).await {
            Ok(socket) => Some(socket),
            Err(err) => {
                self.inner.errors.socket_conn.fetch_add(1, Ordering::Relaxed);
                error!(error = %err, "error opening socket");
                if config.exit_on_socket_conn_error {
                    return Cycle {
                        samples: Vec::new(),
                        outcome: CycleOutcome::Fatal,
                    };
                }
                None
            }
        };

        let mut samples = vec![Sample::new(&sample::UP, bool_value(socket.is_some()))];
        let mut outcome = CycleOutcome::Degraded;

        if let Some(mut socket) = socket {
            let mut cycle = CycleState {
                collector: self,
                samples: &mut samples,
                failures: 0,
            };
            cycle.jails(&mut socket).await;
            cycle.version(&mut socket).await;
            if let Some(geoip) = &self.inner.geoip {
                cycle.locations(&mut socket, geoip).await;
            }
            if cycle.failures == 0 {
                outcome = CycleOutcome::Ok;
            }
            socket.close().await;
        }

        let errors = &self.inner.errors;
        samples.push(
            Sample::new(&sample::ERRORS, counter_value(errors.socket_conn()))
                .label("type", "socket_conn"),
        );
        samples.push(
            Sample::new(&sample::ERRORS, counter_value(errors.socket_req()))
                .label("type", "socket_req"),
        );

        debug!(samples = samples.len(), outcome = ?outcome, "collection cycle finished");
        Cycle { samples, outcome }
    }
}

/// Per-cycle bookkeeping while connected
struct CycleState<'a> {
    collector: &'a Collector,
    samples: &'a mut Vec<Sample>,
    failures: usize,
}

impl CycleState<'_> {
    fn failed(&mut self, err: &Fail2BanError) {
        self.failures += 1;
        self.collector
            .inner
            .errors
            .socket_req
            .fetch_add(1, Ordering::Relaxed);
        warn!(command = err.command(), error = %err, "request failed");
    }

    fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    async fn jails(&mut self, socket: &mut Fail2BanSocket) {
        let jails = match socket.jails().await {
            Ok(jails) => jails,
            Err(err) => return self.failed(&err),
        };

        self.push(Sample::new(&sample::JAIL_COUNT, count_value(jails.len())));

        for jail in &jails {
            match socket.jail(jail).stats().await {
                Ok(stats) => {
                    for (desc, value) in [
                        (&sample::JAIL_FAILED_CURRENT, stats.failed_current),
                        (&sample::JAIL_FAILED_TOTAL, stats.failed_total),
                        (&sample::JAIL_BANNED_CURRENT, stats.banned_current),
                        (&sample::JAIL_BANNED_TOTAL, stats.banned_total),
                    ] {
                        self.push(Sample::new(desc, int_value(value)).label("jail", jail.as_str()));
                    }
                }
                Err(err) => self.failed(&err),
            }

            if self.collector.inner.config.jail_config_metrics {
                self.jail_config(socket, jail).await;
            }
        }
    }

    async fn jail_config(&mut self, socket: &mut Fail2BanSocket, jail: &str) {
        let mut api = socket.jail(jail);
        let results = [
            (&sample::CONFIG_BAN_TIME, api.ban_time().await),
            (&sample::CONFIG_FIND_TIME, api.find_time().await),
            (&sample::CONFIG_MAX_RETRIES, api.max_retries().await),
        ];
        for (desc, result) in results {
            match result {
                Ok(value) => self.push(Sample::new(desc, int_value(value)).label("jail", jail)),
                Err(err) => self.failed(&err),
            }
        }
    }

    async fn version(&mut self, socket: &mut Fail2BanSocket) {
        match socket.version().await {
            Ok(version) => self.push(
                Sample::new(&sample::VERSION, 1.0)
                    .label("version", version)
                    .label("exporter_version", EXPORTER_VERSION),
            ),
            Err(err) => self.failed(&err),
        }
    }

    async fn locations(&mut self, socket: &mut Fail2BanSocket, geoip: &GeoIpClient) {
        let locations = match socket.banned_locations(geoip).await {
            Ok(locations) => locations,
            Err(err) => return self.failed(&err),
        };

        for location in locations {
            self.push(
                Sample::new(&sample::BANNED_LOCATION, counter_value(location.count))
                    .label("geo_id", location.geo_id.to_string())
                    .label("country_code", location.country_code)
                    .label("country_name", location.country_name)
                    .label("city", location.city_name)
                    .label("latitude", location.lat.to_string())
                    .label("longitude", location.lon.to_string()),
            );
        }
    }
}

fn bool_value(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

#[allow(clippy::cast_precision_loss)]
fn int_value(v: i64) -> f64 {
    v as f64
}

#[allow(clippy::cast_precision_loss)]
fn counter_value(v: u64) -> f64 {
    v as f64
}

#[allow(clippy::cast_precision_loss)]
fn count_value(v: usize) -> f64 {
    v as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeoIpConfig;

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = CollectorConfig {
            geoip: Some(GeoIpConfig::new("::not a url::")),
            ..CollectorConfig::default()
        };
        assert!(Collector::new(config).is_err());
    }

    #[test]
    fn test_clones_share_counters() {
        let collector = Collector::new(CollectorConfig::default()).unwrap();
        let clone = collector.clone();
        collector.inner.errors.socket_req.fetch_add(2, Ordering::Relaxed);
        assert_eq!(clone.errors().socket_req(), 2);
        assert_eq!(clone.errors().socket_conn(), 0);
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(bool_value(true), 1.0);
        assert_eq!(bool_value(false), 0.0);
        assert_eq!(int_value(-1), -1.0);
        assert_eq!(count_value(2), 2.0);
    }
}
