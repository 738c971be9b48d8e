//! Command implementations.

pub mod banned;
pub mod collect;
pub mod jails;
pub mod ping;

use anyhow::{Context as _, Result};
use f2b_client::Fail2BanSocket;
use f2b_collector::CollectorConfig;

/// Open the configured socket.
async fn connect(config: &CollectorConfig) -> Result<Fail2BanSocket> {
    Fail2BanSocket::connect(&config.socket_path)
        .await
        .with_context(|| format!("connecting to {}", config.socket_path.display()))
}
