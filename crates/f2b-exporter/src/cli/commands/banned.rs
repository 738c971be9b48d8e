//! `f2b-exporter banned` - banned addresses, or their locations.

use anyhow::Result;
use f2b_client::GeoIpClient;
use f2b_collector::CollectorConfig;
use std::process::ExitCode;
use tabled::{Table, Tabled};

use super::connect;

#[derive(Tabled)]
struct LocationRow {
    #[tabled(rename = "Country")]
    country: String,
    #[tabled(rename = "City")]
    city: String,
    #[tabled(rename = "Geo ID")]
    geo_id: i64,
    #[tabled(rename = "Banned")]
    count: u64,
}

pub async fn execute(config: CollectorConfig) -> Result<ExitCode> {
    let mut socket = connect(&config).await?;

    match &config.geoip {
        None => {
            for ip in socket.banned().await? {
                println!("{ip}");
            }
        }
        Some(geoip) => {
            let client = GeoIpClient::builder(geoip.url.as_str())
                .timeout(geoip.timeout())
                .build()?;
            let mut locations = socket.banned_locations(&client).await?;
            locations.sort_by(|a, b| b.count.cmp(&a.count).then(a.geo_id.cmp(&b.geo_id)));

            let rows = locations.into_iter().map(|location| LocationRow {
                country: format!("{} ({})", location.country_name, location.country_code),
                city: location.city_name,
                geo_id: location.geo_id,
                count: location.count,
            });
            println!("{}", Table::new(rows));
        }
    }

    socket.close().await;
    Ok(ExitCode::SUCCESS)
}
