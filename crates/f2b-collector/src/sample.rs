//! Metric samples and their text exposition.

use crate::{CollectorError, Result};
use prometheus::{CounterVec, Encoder, GaugeVec, Opts, Registry, TextEncoder};
use std::collections::hash_map::{Entry, HashMap};

/// Prometheus metric type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    /// Value that can go up and down
    Gauge,
    /// Monotonically increasing value
    Counter,
}

/// Static description of a metric
#[derive(Debug, PartialEq, Eq)]
pub struct MetricDesc {
    /// Metric name
    pub name: &'static str,
    /// `# HELP` text
    pub help: &'static str,
    /// `# TYPE`
    pub kind: MetricType,
}

const fn gauge(name: &'static str, help: &'static str) -> MetricDesc {
    MetricDesc {
        name,
        help,
        kind: MetricType::Gauge,
    }
}

pub static UP: MetricDesc = gauge("f2b_up", "Check if the fail2ban server is up");
pub static JAIL_COUNT: MetricDesc = gauge("f2b_jail_count", "Number of defined jails");
pub static JAIL_FAILED_CURRENT: MetricDesc = gauge(
    "f2b_jail_failed_current",
    "Number of current failures on this jail's filter",
);
pub static JAIL_FAILED_TOTAL: MetricDesc = gauge(
    "f2b_jail_failed_total",
    "Number of total failures on this jail's filter",
);
pub static JAIL_BANNED_CURRENT: MetricDesc = gauge(
    "f2b_jail_banned_current",
    "Number of IPs currently banned in this jail",
);
pub static JAIL_BANNED_TOTAL: MetricDesc = gauge(
    "f2b_jail_banned_total",
    "Total number of IPs banned by this jail (includes expired bans)",
);
pub static CONFIG_BAN_TIME: MetricDesc = gauge(
    "f2b_config_jail_ban_time",
    "How long an IP is banned for in this jail (in seconds)",
);
pub static CONFIG_FIND_TIME: MetricDesc = gauge(
    "f2b_config_jail_find_time",
    "How far back the filter will look for failures in this jail (in seconds)",
);
pub static CONFIG_MAX_RETRIES: MetricDesc = gauge(
    "f2b_config_jail_max_retries",
    "The number of failures allowed until the IP is banned by this jail",
);
pub static VERSION: MetricDesc = gauge(
    "f2b_version",
    "Version of the exporter and fail2ban server",
);
pub static BANNED_LOCATION: MetricDesc = gauge(
    "f2b_banned_location",
    "Number of banned IPs per location",
);
pub static ERRORS: MetricDesc = MetricDesc {
    name: "f2b_errors",
    help: "Number of errors found since startup",
    kind: MetricType::Counter,
};

/// One labelled value of a metric
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Metric this sample belongs to
    pub desc: &'static MetricDesc,
    /// Label pairs, in output order
    pub labels: Vec<(&'static str, String)>,
    /// Sample value
    pub value: f64,
}

impl Sample {
    /// Unlabelled sample
    #[must_use]
    pub fn new(desc: &'static MetricDesc, value: f64) -> Self {
        Self {
            desc,
            labels: Vec::new(),
            value,
        }
    }

    /// Add a label
    #[must_use]
    pub fn label(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.labels.push((name, value.into()));
        self
    }

    /// Metric name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.desc.name
    }

    /// Value of label `name`, if set
    #[must_use]
    pub fn label_value(&self, name: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Render samples in the Prometheus text exposition format.
///
/// Samples are loaded into a throwaway [`Registry`]: one `GaugeVec` or
/// `CounterVec` per metric, labelled by the names on its first sample.
/// Every sample of a metric must carry the same label names.
pub fn render(samples: &[Sample]) -> Result<String> {
    let registry = Registry::new();
    let mut families: HashMap<&'static str, Family> = HashMap::new();

    for sample in samples {
        let family = match families.entry(sample.desc.name) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let family = Family::new(sample)?;
                registry.register(family.collector())?;
                entry.insert(family)
            }
        };
        family.observe(sample)?;
    }

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| CollectorError::Metrics(prometheus::Error::Msg(e.to_string())))
}

/// Metric vector backing one [`MetricDesc`] while rendering
enum Family {
    Gauge(GaugeVec),
    Counter(CounterVec),
}

impl Family {
    fn new(sample: &Sample) -> prometheus::Result<Self> {
        let desc = sample.desc;
        let opts = Opts::new(desc.name, desc.help);
        let names: Vec<&str> = sample.labels.iter().map(|(name, _)| *name).collect();
        Ok(match desc.kind {
            MetricType::Gauge => Self::Gauge(GaugeVec::new(opts, &names)?),
            MetricType::Counter => Self::Counter(CounterVec::new(opts, &names)?),
        })
    }

    fn collector(&self) -> Box<dyn prometheus::core::Collector> {
        match self {
            Self::Gauge(vec) => Box::new(vec.clone()),
            Self::Counter(vec) => Box::new(vec.clone()),
        }
    }

    // Gauges take the last value for a label set, counters accumulate.
    fn observe(&self, sample: &Sample) -> prometheus::Result<()> {
        let values: Vec<&str> = sample.labels.iter().map(|(_, value)| value.as_str()).collect();
        match self {
            Self::Gauge(vec) => vec.get_metric_with_label_values(&values)?.set(sample.value),
            Self::Counter(vec) => vec
                .get_metric_with_label_values(&values)?
                .inc_by(sample.value),
        }
        Ok(())
    }
}
