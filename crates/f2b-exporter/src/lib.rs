//! # f2b-exporter
//!
//! Command-line front end for the fail2ban exporter.
//!
//! ## Commands
//!
//! - **collect**: run one collection cycle and print the exposition text
//! - **ping**: check that the daemon answers
//! - **jails**: show each jail's counters and settings
//! - **banned**: list banned addresses, or their locations with GeoIP

pub mod cli;
pub mod config;

pub use cli::run;
