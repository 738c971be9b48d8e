//! Per-jail commands.

use super::bad_format;
use crate::response;
use crate::Fail2BanSocket;
use f2b_core::{Fail2BanError, JailStats, Result};
use tracing::debug;

/// Commands scoped to one jail, obtained from [`Fail2BanSocket::jail`]
pub struct JailApi<'a> {
    socket: &'a mut Fail2BanSocket,
    name: &'a str,
}

impl<'a> JailApi<'a> {
    pub(crate) fn new(socket: &'a mut Fail2BanSocket, name: &'a str) -> Self {
        Self { socket, name }
    }

    /// `status <jail>`: failed and banned counters.
    ///
    /// A reply that cannot be read all the way through is an error; the
    /// counters read so far are logged, never returned.
    pub async fn stats(&mut self) -> Result<JailStats> {
        let reply = self.socket.send_command(&["status", self.name]).await?;
        response::jail_stats(&reply).map_err(|incomplete| {
            debug!(jail = self.name, partial = ?incomplete.partial, "incomplete jail stats");
            Fail2BanError::bad_format(format!("status {}", self.name), incomplete.error, &reply)
        })
    }

    /// `get <jail> bantime`, in seconds
    pub async fn ban_time(&mut self) -> Result<i64> {
        self.get_int("bantime").await
    }

    /// `get <jail> findtime`, in seconds
    pub async fn find_time(&mut self) -> Result<i64> {
        self.get_int("findtime").await
    }

    /// `get <jail> maxretry`
    pub async fn max_retries(&mut self) -> Result<i64> {
        self.get_int("maxretry").await
    }

    async fn get_int(&mut self, option: &str) -> Result<i64> {
        let reply = self.socket.send_command(&["get", self.name, option]).await?;
        let command = format!("get {} {option}", self.name);
        response::int_value(&reply).map_err(bad_format(&command, &reply))
    }
}
