//! Replies shaped like the ones fail2ban sends.
//!
//! Each builder returns the full `(0, payload)` envelope.

use f2b_core::Value;

fn pair(label: &str, value: Value) -> Value {
    Value::Tuple(vec![Value::from(label), value])
}

/// Successful envelope around `payload`
pub fn ok(payload: Value) -> Value {
    Value::Tuple(vec![Value::Int(0), payload])
}

/// Failed envelope carrying an exception object, as the daemon sends for
/// unknown jails or commands
pub fn error(class: &str, message: &str) -> Value {
    Value::Tuple(vec![
        Value::Int(1),
        Value::Object {
            class: class.to_string(),
            args: vec![Value::from(message)],
        },
    ])
}

/// `ping`
pub fn pong() -> Value {
    ok(Value::from("pong"))
}

/// `status`
pub fn status(jails: &[&str]) -> Value {
    let count = i64::try_from(jails.len()).unwrap_or(i64::MAX);
    ok(Value::List(vec![
        pair("Number of jail", Value::Int(count)),
        pair("Jail list", Value::from(jails.join(", "))),
    ]))
}

/// `status <jail>`
pub fn jail_status(
    failed_current: i64,
    failed_total: i64,
    banned_current: i64,
    banned_total: i64,
) -> Value {
    ok(Value::List(vec![
        pair(
            "Filter",
            Value::List(vec![
                pair("Currently failed", Value::Int(failed_current)),
                pair("Total failed", Value::Int(failed_total)),
                pair(
                    "File list",
                    Value::List(vec![Value::from("/var/log/auth.log")]),
                ),
            ]),
        ),
        pair(
            "Actions",
            Value::List(vec![
                pair("Currently banned", Value::Int(banned_current)),
                pair("Total banned", Value::Int(banned_total)),
                pair("Banned IP list", Value::List(Vec::new())),
            ]),
        ),
    ]))
}

/// `get <jail> <option>` for integer options
pub fn int(value: i64) -> Value {
    ok(Value::Int(value))
}

/// `version`
pub fn version(version: &str) -> Value {
    ok(Value::from(version))
}

/// `banned`
pub fn banned(jails: &[(&str, &[&str])]) -> Value {
    ok(Value::List(
        jails
            .iter()
            .map(|(jail, ips)| {
                Value::Dict(vec![(
                    (*jail).to_string(),
                    Value::List(ips.iter().map(|ip| Value::from(*ip)).collect()),
                )])
            })
            .collect(),
    ))
}
