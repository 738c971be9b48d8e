#![deny(unsafe_code)]

//! Shared test utilities for the f2b-exporter workspace.
//!
//! Provides a fake fail2ban daemon listening on a temporary Unix socket,
//! builders for the replies the real daemon sends, and a tracing helper.
//!
//! Add this crate as a `[dev-dependency]` in any workspace member:
//!
//! ```toml
//! [dev-dependencies]
//! f2b-test-utils = { workspace = true }
//! ```

pub mod daemon;
pub mod replies;
pub mod tracing_setup;

pub use daemon::{FakeDaemon, FakeDaemonBuilder, Reply};
pub use tracing_setup::init_test_tracing;
