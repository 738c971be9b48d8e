//! Core types for the fail2ban exporter.
//!
//! This crate provides the foundations shared by the socket client and the
//! metrics collector:
//!
//! - **Value tree**: [`Value`], the decoded form of any daemon message
//! - **Navigation**: [`Node`], positional shape assertions over a [`Value`]
//! - **Codec**: the pickle subset spoken on the fail2ban control socket
//! - **Types**: [`JailStats`] and [`GeoRecord`]
//! - **Errors**: [`Fail2BanError`] and friends
//!
//! # Example
//!
//! ```rust
//! use f2b_core::{codec, Node, Value};
//!
//! let bytes = codec::encode_value(&Value::Tuple(vec![Value::Int(0), Value::from("pong")]));
//! let value = codec::decode(&bytes).unwrap();
//!
//! let envelope = Node::root(&value).expect_tuple(2).unwrap();
//! assert_eq!(envelope.at(1).unwrap().expect_str().unwrap(), "pong");
//! ```

#![doc(html_root_url = "https://docs.rs/f2b-core/0.4.0")]

pub mod codec;
mod error;
mod node;
pub mod types;
mod value;

pub use error::{DecodeError, DecodeReason, ErrorKind, Fail2BanError, Result, ShapeError};
pub use node::{DictNode, Node, Seq};
pub use types::*;
pub use value::Value;
