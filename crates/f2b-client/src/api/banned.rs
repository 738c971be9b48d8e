//! The `banned` snapshot.

use super::bad_format;
use crate::geoip::GeoIpClient;
use crate::response;
use crate::Fail2BanSocket;
use f2b_core::{Fail2BanError, GeoRecord, Result, Value};
use std::collections::BTreeSet;

impl Fail2BanSocket {
    /// `banned`: every currently banned address, across all jails, once.
    pub async fn banned(&mut self) -> Result<BTreeSet<String>> {
        let reply = self.send_command(&["banned"]).await?;
        response::banned_ips(&reply).map_err(bad_format("banned", &reply))
    }

    /// Banned addresses resolved through `geoip` and grouped by location.
    ///
    /// Any lookup failure fails the whole call; no partial list is returned.
    pub async fn banned_locations(&mut self, geoip: &GeoIpClient) -> Result<Vec<GeoRecord>> {
        let ips = self.banned().await?;
        geoip.lookup(&ips).await.map_err(|error| {
            let looked_up = Value::List(ips.iter().map(|ip| Value::from(ip.as_str())).collect());
            Fail2BanError::bad_format("banned", error, &looked_up)
        })
    }
}
