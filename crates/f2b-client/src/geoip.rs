//! GeoIP enrichment of banned addresses.

use f2b_core::types::GeoLookupResponse;
use f2b_core::GeoRecord;
use reqwest::Client as HttpClient;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from the GeoIP lookup service
#[derive(Error, Debug)]
pub enum GeoIpError {
    /// Invalid service URL
    #[error("invalid GeoIP URL: {0}")]
    Url(#[from] url::ParseError),

    /// Transport failure
    #[error("GeoIP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("GeoIP service returned HTTP {0}")]
    Status(u16),

    /// Body is not the expected JSON document
    #[error("GeoIP response could not be parsed: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Client for the GeoIP lookup service
#[derive(Clone, Debug)]
pub struct GeoIpClient {
    inner: Arc<ClientInner>,
}

#[derive(Debug)]
struct ClientInner {
    http: HttpClient,
    url: Url,
}

impl GeoIpClient {
    /// Create a client with default settings
    pub fn new(url: &str) -> Result<Self, GeoIpError> {
        GeoIpClientBuilder::new(url).build()
    }

    /// Create a builder for custom configuration
    #[must_use]
    pub fn builder(url: impl Into<String>) -> GeoIpClientBuilder {
        GeoIpClientBuilder::new(url)
    }

    /// Lookup service URL
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.inner.url
    }

    /// Resolve `ips` and group the results by location.
    ///
    /// The whole set goes out in one request as a comma-separated `ips` form
    /// field. An empty set returns an empty result without calling out.
    pub async fn lookup(&self, ips: &BTreeSet<String>) -> Result<Vec<GeoRecord>, GeoIpError> {
        if ips.is_empty() {
            debug!("no banned addresses, skipping GeoIP lookup");
            return Ok(Vec::new());
        }

        let joined = ips.iter().map(String::as_str).collect::<Vec<_>>().join(",");
        debug!(url = %self.inner.url, addresses = ips.len(), "POST form request");

        let response = self
            .inner
            .http
            .post(self.inner.url.clone())
            .form(&[("ips", joined.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "GeoIP lookup rejected");
            return Err(GeoIpError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let parsed: GeoLookupResponse = serde_json::from_str(&body)?;
        Ok(aggregate(parsed.city))
    }
}

/// Collapse records sharing a geo-id into one, counting occurrences.
///
/// The first record seen for a geo-id keeps its attributes. Output order is
/// unspecified.
#[must_use]
pub fn aggregate(records: Vec<GeoRecord>) -> Vec<GeoRecord> {
    let mut locations: HashMap<i64, GeoRecord> = HashMap::new();
    for record in records {
        locations
            .entry(record.geo_id)
            .and_modify(|seen| seen.count += 1)
            .or_insert(GeoRecord { count: 1, ..record });
    }
    locations.into_values().collect()
}

/// Builder for configuring a [`GeoIpClient`]
pub struct GeoIpClientBuilder {
    url: String,
    timeout: Duration,
    user_agent: String,
}

impl GeoIpClientBuilder {
    /// Create a new builder for the given service URL
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("f2b-exporter/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Set the request timeout
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the User-Agent header
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Build the client
    pub fn build(self) -> Result<GeoIpClient, GeoIpError> {
        let url = Url::parse(&self.url)?;
        let http = HttpClient::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .gzip(true)
            .build()?;

        Ok(GeoIpClient {
            inner: Arc::new(ClientInner { http, url }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(geo_id: i64, ip: &str) -> GeoRecord {
        GeoRecord {
            ip: ip.to_string(),
            network: String::new(),
            geo_id,
            country_code: "FR".to_string(),
            country_name: "France".to_string(),
            city_name: "Paris".to_string(),
            lat: 48.85,
            lon: 2.35,
            count: 0,
        }
    }

    #[test]
    fn test_aggregate_same_location() {
        let records = (0..5).map(|i| record(42, &format!("192.0.2.{i}"))).collect();
        let grouped = aggregate(records);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].count, 5);
        assert_eq!(grouped[0].ip, "192.0.2.0");
    }

    #[test]
    fn test_aggregate_distinct_locations() {
        let mut grouped = aggregate(vec![
            record(1, "192.0.2.1"),
            record(2, "192.0.2.2"),
            record(1, "192.0.2.3"),
        ]);
        grouped.sort_by_key(|r| r.geo_id);
        assert_eq!(
            grouped.iter().map(|r| (r.geo_id, r.count)).collect::<Vec<_>>(),
            vec![(1, 2), (2, 1)]
        );
    }

    #[test]
    fn test_aggregate_empty() {
        assert!(aggregate(Vec::new()).is_empty());
    }

    #[test]
    fn test_builder_rejects_bad_url() {
        let err = GeoIpClient::builder("not a url").build().unwrap_err();
        assert!(matches!(err, GeoIpError::Url(_)));
    }

    #[tokio::test]
    async fn test_empty_set_skips_request() {
        // nothing listens here; a request would fail
        let client = GeoIpClient::new("http://127.0.0.1:9/geoip").unwrap();
        let located = client.lookup(&BTreeSet::new()).await.unwrap();
        assert!(located.is_empty());
    }
}
