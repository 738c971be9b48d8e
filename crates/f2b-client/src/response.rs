//! Shape contracts for daemon replies.
//!
//! Each function takes a decoded reply and walks it by fixed position,
//! returning the typed result or the first [`ShapeError`] met on the way.
//! They never touch the socket, so they can be exercised on synthetic trees.

use f2b_core::{JailStats, Node, Seq, ShapeError, Value};
use std::collections::BTreeSet;
use thiserror::Error;

/// A `status <jail>` reply that could only be read part of the way.
///
/// Counters are filled in order (failed current, failed total, banned
/// current, banned total); `partial` holds those read before `error`,
/// the rest are left at [`f2b_core::types::UNDETERMINED`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("incomplete jail stats: {error}")]
pub struct IncompleteStats {
    /// Counters read before the mismatch
    pub partial: JailStats,
    /// Where the reply diverged
    #[source]
    pub error: ShapeError,
}

/// Check the `(status, payload)` envelope and return the payload.
///
/// A nonzero status means the daemon raised an exception; its payload is
/// never the documented shape, so it is rejected here.
pub fn payload(value: &Value) -> Result<Node<'_>, ShapeError> {
    let envelope = Node::root(value).expect_tuple(2)?;
    let status = envelope.at(0)?;
    match status.expect_int()? {
        0 => envelope.at(1),
        code => Err(ShapeError {
            path: status.path().to_string(),
            expected: "status 0".to_string(),
            found: format!("status {code}"),
        }),
    }
}

/// `ping`: true for `"pong"`, false for any other string.
pub fn pong(value: &Value) -> Result<bool, ShapeError> {
    Ok(payload(value)?.expect_str()? == "pong")
}

/// `status`: the comma-separated jail list held in the second entry.
pub fn jail_names(value: &Value) -> Result<Vec<String>, ShapeError> {
    let list = payload(value)?
        .expect_list()?
        .at(1)?
        .expect_tuple(2)?
        .at(1)?
        .expect_str()?;

    Ok(list
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect())
}

/// `status <jail>`: filter counters from the first section, action
/// counters from the second.
pub fn jail_stats(value: &Value) -> Result<JailStats, IncompleteStats> {
    let mut stats = JailStats::default();
    match fill_stats(value, &mut stats) {
        Ok(()) => Ok(stats),
        Err(error) => Err(IncompleteStats {
            partial: stats,
            error,
        }),
    }
}

fn fill_stats(value: &Value, stats: &mut JailStats) -> Result<(), ShapeError> {
    let sections = payload(value)?.expect_list()?;

    let filter = section(&sections, 0)?;
    stats.failed_current = counter(&filter, 0)?;
    stats.failed_total = counter(&filter, 1)?;

    let actions = section(&sections, 1)?;
    stats.banned_current = counter(&actions, 0)?;
    stats.banned_total = counter(&actions, 1)?;
    Ok(())
}

/// `("Filter", [...])` -> the inner list
fn section<'a>(sections: &Seq<'a>, index: usize) -> Result<Seq<'a>, ShapeError> {
    sections.at(index)?.expect_tuple(2)?.at(1)?.expect_list()
}

/// `("Currently failed", 2)` -> 2
fn counter(section: &Seq<'_>, index: usize) -> Result<i64, ShapeError> {
    section.at(index)?.expect_tuple(2)?.at(1)?.expect_int()
}

/// `get <jail> bantime|findtime|maxretry`
pub fn int_value(value: &Value) -> Result<i64, ShapeError> {
    payload(value)?.expect_int()
}

/// `version`
pub fn text_value(value: &Value) -> Result<String, ShapeError> {
    payload(value)?.expect_str().map(String::from)
}

/// `banned`: a list of single-key `{jail: [ip, ...]}` dicts, flattened into
/// one set so an address banned in several jails appears once.
pub fn banned_ips(value: &Value) -> Result<BTreeSet<String>, ShapeError> {
    let jails = payload(value)?.expect_list()?;
    let mut ips = BTreeSet::new();

    for jail in jails.iter() {
        let dict = jail.expect_dict()?;
        let (_, banned) = dict.single_entry()?;
        for ip in banned.expect_list()?.iter() {
            ips.insert(ip.expect_str()?.to_string());
        }
    }

    Ok(ips)
}
