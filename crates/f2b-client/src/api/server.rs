//! Server-wide commands.

use super::{bad_format, JailApi};
use crate::response;
use crate::Fail2BanSocket;
use f2b_core::Result;

/// Timeout argument passed with `ping`
const PING_TIMEOUT: &str = "100";

impl Fail2BanSocket {
    /// `ping 100`: true if the daemon answered `pong`.
    pub async fn ping(&mut self) -> Result<bool> {
        let reply = self.send_command(&["ping", PING_TIMEOUT]).await?;
        response::pong(&reply).map_err(bad_format("ping", &reply))
    }

    /// `status`: names of the configured jails, in daemon order.
    pub async fn jails(&mut self) -> Result<Vec<String>> {
        let reply = self.send_command(&["status"]).await?;
        response::jail_names(&reply).map_err(bad_format("status", &reply))
    }

    /// `version`: the daemon's version string.
    pub async fn version(&mut self) -> Result<String> {
        let reply = self.send_command(&["version"]).await?;
        response::text_value(&reply).map_err(bad_format("version", &reply))
    }

    /// Commands scoped to one jail
    #[must_use]
    pub fn jail<'a>(&'a mut self, name: &'a str) -> JailApi<'a> {
        JailApi::new(self, name)
    }
}
