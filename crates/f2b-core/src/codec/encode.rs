//! Pickle encoder.

use super::op;
use crate::value::Value;

/// Protocol written in the `PROTO` header. Protocol 2 is readable by every
/// fail2ban release, including the Python 2 ones.
const PROTOCOL: u8 = 2;

/// Serialise a command as a pickled list of strings.
///
/// The caller appends [`super::COMMAND_TERMINATOR`] when writing the frame.
pub fn encode_command(parts: &[&str]) -> Vec<u8> {
    let list = Value::List(parts.iter().map(|part| Value::from(*part)).collect());
    encode_value(&list)
}

/// Serialise any [`Value`].
///
/// Objects are written as a `GLOBAL` reference followed by `REDUCE`, which is
/// how the daemon itself pickles its exceptions and `IPAddr` instances.
pub fn encode_value(value: &Value) -> Vec<u8> {
    let mut out = vec![op::PROTO, PROTOCOL];
    write_value(&mut out, value);
    out.push(op::STOP);
    out
}

fn write_value(out: &mut Vec<u8>, value: &Value) {
    match value {
        Value::None => out.push(op::NONE),
        Value::Bool(true) => out.push(op::NEWTRUE),
        Value::Bool(false) => out.push(op::NEWFALSE),
        Value::Int(i) => write_int(out, *i),
        Value::Float(x) => {
            out.push(op::BINFLOAT);
            out.extend_from_slice(&x.to_be_bytes());
        }
        Value::Str(s) => write_str(out, s),
        Value::Bytes(bytes) => {
            if let Ok(len) = u8::try_from(bytes.len()) {
                out.push(op::SHORT_BINBYTES);
                out.push(len);
            } else if let Ok(len) = u32::try_from(bytes.len()) {
                out.push(op::BINBYTES);
                out.extend_from_slice(&len.to_le_bytes());
            } else {
                out.push(op::BINBYTES8);
                out.extend_from_slice(&(bytes.len() as u64).to_le_bytes());
            }
            out.extend_from_slice(bytes);
        }
        Value::Tuple(items) => write_tuple(out, items),
        Value::List(items) => {
            out.push(op::EMPTY_LIST);
            if !items.is_empty() {
                out.push(op::MARK);
                for item in items {
                    write_value(out, item);
                }
                out.push(op::APPENDS);
            }
        }
        Value::Dict(entries) => {
            out.push(op::EMPTY_DICT);
            if !entries.is_empty() {
                out.push(op::MARK);
                for (key, value) in entries {
                    write_str(out, key);
                    write_value(out, value);
                }
                out.push(op::SETITEMS);
            }
        }
        Value::Object { class, args } => {
            let (module, name) = class.rsplit_once('.').unwrap_or(("builtins", class));
            out.push(op::GLOBAL);
            out.extend_from_slice(module.as_bytes());
            out.push(b'\n');
            out.extend_from_slice(name.as_bytes());
            out.push(b'\n');
            write_tuple(out, args);
            out.push(op::REDUCE);
        }
    }
}

fn write_int(out: &mut Vec<u8>, i: i64) {
    if let Ok(n) = u8::try_from(i) {
        out.push(op::BININT1);
        out.push(n);
    } else if let Ok(n) = u16::try_from(i) {
        out.push(op::BININT2);
        out.extend_from_slice(&n.to_le_bytes());
    } else if let Ok(n) = i32::try_from(i) {
        out.push(op::BININT);
        out.extend_from_slice(&n.to_le_bytes());
    } else {
        let bytes = long_bytes(i);
        out.push(op::LONG1);
        // at most 8 bytes
        out.push(bytes.len() as u8);
        out.extend_from_slice(&bytes);
    }
}

/// Minimal little-endian two's complement.
fn long_bytes(i: i64) -> Vec<u8> {
    let mut bytes = i.to_le_bytes().to_vec();
    while let [.., prev, last] = bytes.as_slice() {
        let redundant =
            (*last == 0x00 && prev & 0x80 == 0) || (*last == 0xff && prev & 0x80 != 0);
        if !redundant {
            break;
        }
        bytes.pop();
    }
    bytes
}

fn write_str(out: &mut Vec<u8>, s: &str) {
    if let Ok(len) = u32::try_from(s.len()) {
        out.push(op::BINUNICODE);
        out.extend_from_slice(&len.to_le_bytes());
    } else {
        out.push(op::BINUNICODE8);
        out.extend_from_slice(&(s.len() as u64).to_le_bytes());
    }
    out.extend_from_slice(s.as_bytes());
}

fn write_tuple(out: &mut Vec<u8>, items: &[Value]) {
    match items.len() {
        0 => out.push(op::EMPTY_TUPLE),
        1..=3 => {
            for item in items {
                write_value(out, item);
            }
            out.push(op::TUPLE1 + (items.len() as u8 - 1));
        }
        _ => {
            out.push(op::MARK);
            for item in items {
                write_value(out, item);
            }
            out.push(op::TUPLE);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode;

    #[test]
    fn test_command_matches_python_framing() {
        // pickle.dumps(["status", "sshd"], 2) without memo opcodes
        let bytes = encode_command(&["status", "sshd"]);
        assert_eq!(
            bytes,
            b"\x80\x02](X\x06\x00\x00\x00statusX\x04\x00\x00\x00sshde.".to_vec()
        );
    }

    #[test]
    fn test_single_word_command() {
        let bytes = encode_command(&["version"]);
        assert_eq!(decode(&bytes).unwrap(), Value::List(vec![Value::from("version")]));
    }

    #[test]
    fn test_integer_widths() {
        for i in [0, 255, 256, 65_535, 65_536, -1, i64::from(i32::MIN), 1 << 40, i64::MIN, i64::MAX] {
            let bytes = encode_value(&Value::Int(i));
            assert_eq!(decode(&bytes).unwrap(), Value::Int(i), "value {i}");
        }
    }

    #[test]
    fn test_long_bytes_are_minimal() {
        assert_eq!(long_bytes(1 << 40), vec![0, 0, 0, 0, 0, 1]);
        assert_eq!(long_bytes(-(1 << 40)), vec![0, 0, 0, 0, 0, 0xff]);
        assert_eq!(long_bytes(i64::MAX).len(), 8);
    }

    #[test]
    fn test_reply_with_exception_object() {
        let reply = Value::Tuple(vec![
            Value::Int(1),
            Value::Object {
                class: "fail2ban.server.jails.UnknownJailException".into(),
                args: vec![Value::from("nope")],
            },
        ]);
        assert_eq!(decode(&encode_value(&reply)).unwrap(), reply);
    }
}
