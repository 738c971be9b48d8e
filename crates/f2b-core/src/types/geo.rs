use serde::{Deserialize, Serialize};

/// A banned location, aggregated by geo-id
///
/// Deserialised from one entry of the GeoIP service's `city` array; `count`
/// is not part of the wire format and is filled in during aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoRecord {
    /// First banned address resolved to this location
    #[serde(rename = "Ip", default)]
    pub ip: String,

    /// Network the address belongs to (CIDR notation)
    #[serde(rename = "Network", default)]
    pub network: String,

    /// Location identifier, the aggregation key
    #[serde(rename = "GeoId")]
    pub geo_id: i64,

    /// Two-letter country code (ISO 3166-1 alpha-2)
    #[serde(rename = "CountryCode", default)]
    pub country_code: String,

    /// Full country name
    #[serde(rename = "CountryName", default)]
    pub country_name: String,

    /// City name
    #[serde(rename = "CityName", default)]
    pub city_name: String,

    /// Latitude coordinate
    #[serde(rename = "Lat", default)]
    pub lat: f64,

    /// Longitude coordinate
    #[serde(rename = "Lon", default)]
    pub lon: f64,

    /// Number of banned addresses resolved to this location
    #[serde(skip_deserializing, default)]
    pub count: u64,
}

impl GeoRecord {
    /// Returns the coordinates as a tuple
    #[must_use]
    pub const fn coordinates(&self) -> (f64, f64) {
        (self.lat, self.lon)
    }
}

/// Body returned by the GeoIP lookup service
#[derive(Debug, Clone, Deserialize)]
pub struct GeoLookupResponse {
    /// City-level records, one per looked-up address
    pub city: Vec<GeoRecord>,
}
