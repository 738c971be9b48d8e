//! Async client for the fail2ban control socket.
//!
//! [`Fail2BanSocket`] owns one connection to the daemon and exposes typed
//! accessors for the handful of commands an exporter needs. The pure
//! interpreters behind those accessors live in [`response`] and can be used
//! on already-decoded values. [`GeoIpClient`] resolves banned addresses to
//! locations through an external lookup service.
//!
//! ```no_run
//! use f2b_client::Fail2BanSocket;
//!
//! # async fn run() -> f2b_client::Result<()> {
//! let mut socket = Fail2BanSocket::connect("/var/run/fail2ban/fail2ban.sock").await?;
//! for jail in socket.jails().await? {
//!     let stats = socket.jail(&jail).stats().await?;
//!     println!("{jail}: {} banned", stats.banned_current);
//! }
//! socket.close().await;
//! # Ok(())
//! # }
//! ```

pub mod api;
mod geoip;
pub mod response;
mod socket;

pub use api::JailApi;
pub use f2b_core::{ErrorKind, Fail2BanError, GeoRecord, JailStats, Result, Value};
pub use geoip::{aggregate, GeoIpClient, GeoIpClientBuilder, GeoIpError};
pub use response::IncompleteStats;
pub use socket::Fail2BanSocket;
