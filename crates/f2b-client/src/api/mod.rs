//! Typed accessors over [`Fail2BanSocket`](crate::Fail2BanSocket).
//!
//! Each accessor sends one fixed command and interprets the reply with the
//! matching function from [`crate::response`]. Shape mismatches become
//! [`Fail2BanError::BadFormat`](f2b_core::Fail2BanError::BadFormat) tagged
//! with the command that produced them.

mod banned;
mod jail;
mod server;

pub use jail::JailApi;

use f2b_core::{Fail2BanError, ShapeError, Value};

/// Attach the command and the raw reply to a shape failure.
pub(crate) fn bad_format<'a>(
    command: &str,
    reply: &'a Value,
) -> impl FnOnce(ShapeError) -> Fail2BanError + 'a {
    let command = command.to_string();
    move |error| Fail2BanError::bad_format(command, error, reply)
}
