//! Pickle decoder producing a [`Value`] tree.

use std::collections::HashMap;
use std::num::IntErrorKind;

use super::op;
use crate::error::{DecodeError, DecodeReason};
use crate::value::Value;

const HIGHEST_PROTOCOL: u8 = 5;

/// Classes whose reduction is a plain set of elements.
const SET_CLASSES: [&str; 4] = [
    "builtins.set",
    "builtins.frozenset",
    "__builtin__.set",
    "__builtin__.frozenset",
];

/// Decode exactly one pickled object.
///
/// Bytes following the `STOP` opcode are ignored. On failure the error
/// carries the offset of the failing opcode and every byte consumed so far.
pub fn decode(input: &[u8]) -> Result<Value, DecodeError> {
    let mut decoder = Decoder {
        input,
        pos: 0,
        op_start: 0,
        stack: Vec::new(),
        marks: Vec::new(),
        memo: HashMap::new(),
    };

    decoder.run().map_err(|reason| DecodeError {
        reason,
        offset: decoder.op_start,
        consumed: input[..decoder.pos].to_vec(),
    })
}

/// Something on the unpickler stack.
#[derive(Debug, Clone)]
enum Slot {
    Value(Value),
    /// A `GLOBAL` reference awaiting `REDUCE`/`NEWOBJ`
    Class(String),
}

impl Slot {
    const fn kind(&self) -> &'static str {
        match self {
            Self::Value(v) => v.kind(),
            Self::Class(_) => "class",
        }
    }
}

#[derive(Debug)]
struct Entry {
    slot: Slot,
    /// Memo slot holding a copy of this entry, refreshed when it is mutated
    memo: Option<u32>,
}

struct Decoder<'a> {
    input: &'a [u8],
    pos: usize,
    op_start: usize,
    stack: Vec<Entry>,
    marks: Vec<usize>,
    memo: HashMap<u32, Slot>,
}

impl<'a> Decoder<'a> {
    fn run(&mut self) -> Result<Value, DecodeReason> {
        loop {
            self.op_start = self.pos;
            let opcode = self.read_u8()?;
            if opcode == op::STOP {
                return match self.pop() {
                    Ok(Slot::Value(value)) => Ok(value),
                    Ok(slot) => Err(DecodeReason::UnexpectedOperand {
                        opcode: "STOP",
                        expected: "value",
                        found: slot.kind(),
                    }),
                    Err(_) => Err(DecodeReason::EmptyResult),
                };
            }
            self.step(opcode)?;
        }
    }

    #[allow(clippy::too_many_lines)]
    fn step(&mut self, opcode: u8) -> Result<(), DecodeReason> {
        match opcode {
            op::PROTO => {
                let proto = self.read_u8()?;
                if proto > HIGHEST_PROTOCOL {
                    return Err(DecodeReason::UnsupportedProtocol(proto));
                }
            }
            op::FRAME => {
                self.take(8)?;
            }
            op::MARK => self.marks.push(self.stack.len()),
            op::POP => {
                if self.stack.len() > self.floor() {
                    self.stack.pop();
                } else {
                    self.pop_mark_entries()?;
                }
            }
            op::POP_MARK => {
                self.pop_mark_entries()?;
            }
            op::DUP => {
                let idx = self.top_index()?;
                let slot = self.stack[idx].slot.clone();
                self.push_slot(slot);
            }

            op::NONE => self.push(Value::None),
            op::NEWTRUE => self.push(Value::Bool(true)),
            op::NEWFALSE => self.push(Value::Bool(false)),

            op::INT => {
                let line = self.read_text_line()?;
                let value = match line {
                    "00" => Value::Bool(false),
                    "01" => Value::Bool(true),
                    _ => Value::Int(parse_int(line)?),
                };
                self.push(value);
            }
            op::BININT => {
                let n = i32::from_le_bytes(self.take_array()?);
                self.push(Value::Int(i64::from(n)));
            }
            op::BININT1 => {
                let n = self.read_u8()?;
                self.push(Value::Int(i64::from(n)));
            }
            op::BININT2 => {
                let n = u16::from_le_bytes(self.take_array()?);
                self.push(Value::Int(i64::from(n)));
            }
            op::LONG => {
                let line = self.read_text_line()?;
                let n = parse_int(line.strip_suffix('L').unwrap_or(line))?;
                self.push(Value::Int(n));
            }
            op::LONG1 => {
                let len = usize::from(self.read_u8()?);
                let bytes = self.take(len)?;
                self.push(Value::Int(decode_long(bytes)?));
            }
            op::LONG4 => {
                let len = self.read_len_i32()?;
                let bytes = self.take(len)?;
                self.push(Value::Int(decode_long(bytes)?));
            }
            op::FLOAT => {
                let line = self.read_text_line()?;
                let x = line
                    .parse::<f64>()
                    .map_err(|_| DecodeReason::InvalidLiteral(line.to_string()))?;
                self.push(Value::Float(x));
            }
            op::BINFLOAT => {
                let x = f64::from_be_bytes(self.take_array()?);
                self.push(Value::Float(x));
            }

            op::STRING => {
                let line = self.read_line()?;
                let bytes = unquote(line)?;
                self.push(text_or_bytes(bytes));
            }
            op::BINSTRING => {
                let len = self.read_len_i32()?;
                let bytes = self.take(len)?.to_vec();
                self.push(text_or_bytes(bytes));
            }
            op::SHORT_BINSTRING => {
                let len = usize::from(self.read_u8()?);
                let bytes = self.take(len)?.to_vec();
                self.push(text_or_bytes(bytes));
            }
            op::UNICODE => {
                let line = self.read_line()?;
                let text = raw_unicode_unescape(line)?;
                self.push(Value::Str(text));
            }
            op::BINUNICODE => {
                let len = self.read_len_u32()?;
                let text = self.read_utf8(len)?;
                self.push(Value::Str(text));
            }
            op::SHORT_BINUNICODE => {
                let len = usize::from(self.read_u8()?);
                let text = self.read_utf8(len)?;
                self.push(Value::Str(text));
            }
            op::BINUNICODE8 => {
                let len = self.read_len_u64()?;
                let text = self.read_utf8(len)?;
                self.push(Value::Str(text));
            }
            op::BINBYTES => {
                let len = self.read_len_u32()?;
                let bytes = self.take(len)?.to_vec();
                self.push(Value::Bytes(bytes));
            }
            op::SHORT_BINBYTES => {
                let len = usize::from(self.read_u8()?);
                let bytes = self.take(len)?.to_vec();
                self.push(Value::Bytes(bytes));
            }
            op::BINBYTES8 | op::BYTEARRAY8 => {
                let len = self.read_len_u64()?;
                let bytes = self.take(len)?.to_vec();
                self.push(Value::Bytes(bytes));
            }

            op::EMPTY_TUPLE => self.push(Value::Tuple(Vec::new())),
            op::TUPLE => {
                let items = self.pop_mark_values("TUPLE")?;
                self.push(Value::Tuple(items));
            }
            op::TUPLE1 | op::TUPLE2 | op::TUPLE3 => {
                let arity = usize::from(opcode - op::TUPLE1) + 1;
                let mut items = Vec::with_capacity(arity);
                for _ in 0..arity {
                    items.push(self.pop_value("TUPLE")?);
                }
                items.reverse();
                self.push(Value::Tuple(items));
            }

            op::EMPTY_LIST => self.push(Value::List(Vec::new())),
            op::LIST => {
                let items = self.pop_mark_values("LIST")?;
                self.push(Value::List(items));
            }
            op::APPEND => {
                let item = self.pop_value("APPEND")?;
                self.extend_top("APPEND", vec![item])?;
            }
            op::APPENDS => {
                let items = self.pop_mark_values("APPENDS")?;
                self.extend_top("APPENDS", items)?;
            }

            op::EMPTY_SET => self.push(Value::List(Vec::new())),
            op::ADDITEMS => {
                let items = self.pop_mark_values("ADDITEMS")?;
                self.extend_top("ADDITEMS", items)?;
            }
            op::FROZENSET => {
                let items = self.pop_mark_values("FROZENSET")?;
                self.push(Value::List(items));
            }

            op::EMPTY_DICT => self.push(Value::Dict(Vec::new())),
            op::DICT => {
                let items = self.pop_mark_values("DICT")?;
                let mut entries = Vec::with_capacity(items.len() / 2);
                insert_pairs("DICT", &mut entries, items)?;
                self.push(Value::Dict(entries));
            }
            op::SETITEM => {
                let value = self.pop_value("SETITEM")?;
                let key = self.pop_value("SETITEM")?;
                self.set_items_on_top("SETITEM", vec![key, value])?;
            }
            op::SETITEMS => {
                let items = self.pop_mark_values("SETITEMS")?;
                self.set_items_on_top("SETITEMS", items)?;
            }

            op::PUT => {
                let line = self.read_text_line()?;
                let id = line
                    .parse::<u32>()
                    .map_err(|_| DecodeReason::InvalidLiteral(line.to_string()))?;
                self.memoize(id)?;
            }
            op::BINPUT => {
                let id = u32::from(self.read_u8()?);
                self.memoize(id)?;
            }
            op::LONG_BINPUT => {
                let id = u32::from_le_bytes(self.take_array()?);
                self.memoize(id)?;
            }
            op::MEMOIZE => {
                let id = u32::try_from(self.memo.len()).map_err(|_| DecodeReason::IntegerOverflow)?;
                self.memoize(id)?;
            }
            op::GET => {
                let line = self.read_text_line()?;
                let id = line
                    .parse::<u32>()
                    .map_err(|_| DecodeReason::InvalidLiteral(line.to_string()))?;
                self.recall(id)?;
            }
            op::BINGET => {
                let id = u32::from(self.read_u8()?);
                self.recall(id)?;
            }
            op::LONG_BINGET => {
                let id = u32::from_le_bytes(self.take_array()?);
                self.recall(id)?;
            }

            op::GLOBAL => {
                let module = self.read_text_line()?.to_string();
                let name = self.read_text_line()?;
                self.push_slot(Slot::Class(format!("{module}.{name}")));
            }
            op::STACK_GLOBAL => {
                let name = self.pop_value("STACK_GLOBAL")?;
                let module = self.pop_value("STACK_GLOBAL")?;
                match (module, name) {
                    (Value::Str(module), Value::Str(name)) => {
                        self.push_slot(Slot::Class(format!("{module}.{name}")));
                    }
                    (module, name) => {
                        let found = if module.as_str().is_none() {
                            module.kind()
                        } else {
                            name.kind()
                        };
                        return Err(DecodeReason::UnexpectedOperand {
                            opcode: "STACK_GLOBAL",
                            expected: "str",
                            found,
                        });
                    }
                }
            }
            op::REDUCE => {
                let args = self.pop_args("REDUCE")?;
                let class = self.pop_class("REDUCE")?;
                self.push(reduce(class, args));
            }
            op::NEWOBJ => {
                let args = self.pop_args("NEWOBJ")?;
                let class = self.pop_class("NEWOBJ")?;
                self.push(Value::Object { class, args });
            }
            op::NEWOBJ_EX => {
                // keyword arguments are not representable and are dropped
                self.pop_value("NEWOBJ_EX")?;
                let args = self.pop_args("NEWOBJ_EX")?;
                let class = self.pop_class("NEWOBJ_EX")?;
                self.push(Value::Object { class, args });
            }
            op::BUILD => {
                // object state is not part of the value tree
                self.pop_value("BUILD")?;
                self.top_index()?;
            }

            other => return Err(DecodeReason::UnknownOpcode(other)),
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Input
    // ---------------------------------------------------------------------

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeReason> {
        let input = self.input;
        let have = input.len() - self.pos;
        if have < n {
            return Err(DecodeReason::Truncated { need: n, have });
        }
        let bytes = &input[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeReason> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn read_u8(&mut self) -> Result<u8, DecodeReason> {
        Ok(self.take(1)?[0])
    }

    fn read_len_i32(&mut self) -> Result<usize, DecodeReason> {
        let len = i32::from_le_bytes(self.take_array()?);
        usize::try_from(len).map_err(|_| DecodeReason::InvalidLiteral(format!("length {len}")))
    }

    fn read_len_u32(&mut self) -> Result<usize, DecodeReason> {
        let len = u32::from_le_bytes(self.take_array()?);
        usize::try_from(len).map_err(|_| DecodeReason::IntegerOverflow)
    }

    fn read_len_u64(&mut self) -> Result<usize, DecodeReason> {
        let len = u64::from_le_bytes(self.take_array()?);
        usize::try_from(len).map_err(|_| DecodeReason::IntegerOverflow)
    }

    fn read_utf8(&mut self, len: usize) -> Result<String, DecodeReason> {
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|_| DecodeReason::InvalidUtf8)
    }

    /// Bytes up to (not including) the next newline.
    fn read_line(&mut self) -> Result<&'a [u8], DecodeReason> {
        let input = self.input;
        let rest = &input[self.pos..];
        let Some(end) = rest.iter().position(|&b| b == b'\n') else {
            return Err(DecodeReason::Truncated {
                need: rest.len() + 1,
                have: rest.len(),
            });
        };
        self.pos += end + 1;
        Ok(&rest[..end])
    }

    fn read_text_line(&mut self) -> Result<&'a str, DecodeReason> {
        let line = self.read_line()?;
        std::str::from_utf8(line).map_err(|_| DecodeReason::InvalidUtf8)
    }

    // ---------------------------------------------------------------------
    // Stack
    // ---------------------------------------------------------------------

    /// Lowest stack index visible above the innermost mark.
    fn floor(&self) -> usize {
        self.marks.last().copied().unwrap_or(0)
    }

    fn top_index(&self) -> Result<usize, DecodeReason> {
        if self.stack.len() > self.floor() {
            Ok(self.stack.len() - 1)
        } else {
            Err(DecodeReason::StackUnderflow)
        }
    }

    fn push(&mut self, value: Value) {
        self.push_slot(Slot::Value(value));
    }

    fn push_slot(&mut self, slot: Slot) {
        self.stack.push(Entry { slot, memo: None });
    }

    fn pop(&mut self) -> Result<Slot, DecodeReason> {
        self.top_index()?;
        self.stack
            .pop()
            .map(|entry| entry.slot)
            .ok_or(DecodeReason::StackUnderflow)
    }

    fn pop_value(&mut self, opcode: &'static str) -> Result<Value, DecodeReason> {
        into_value(opcode, self.pop()?)
    }

    fn pop_class(&mut self, opcode: &'static str) -> Result<String, DecodeReason> {
        match self.pop()? {
            Slot::Class(class) => Ok(class),
            Slot::Value(value) => Err(DecodeReason::UnexpectedOperand {
                opcode,
                expected: "class",
                found: value.kind(),
            }),
        }
    }

    fn pop_args(&mut self, opcode: &'static str) -> Result<Vec<Value>, DecodeReason> {
        match self.pop_value(opcode)? {
            Value::Tuple(args) => Ok(args),
            other => Err(DecodeReason::UnexpectedOperand {
                opcode,
                expected: "tuple",
                found: other.kind(),
            }),
        }
    }

    fn pop_mark_entries(&mut self) -> Result<Vec<Entry>, DecodeReason> {
        let mark = self.marks.pop().ok_or(DecodeReason::MissingMark)?;
        if mark > self.stack.len() {
            return Err(DecodeReason::StackUnderflow);
        }
        Ok(self.stack.split_off(mark))
    }

    fn pop_mark_values(&mut self, opcode: &'static str) -> Result<Vec<Value>, DecodeReason> {
        self.pop_mark_entries()?
            .into_iter()
            .map(|entry| into_value(opcode, entry.slot))
            .collect()
    }

    fn extend_top(&mut self, opcode: &'static str, items: Vec<Value>) -> Result<(), DecodeReason> {
        let idx = self.top_index()?;
        match &mut self.stack[idx].slot {
            Slot::Value(Value::List(list)) => list.extend(items),
            other => {
                return Err(DecodeReason::UnexpectedOperand {
                    opcode,
                    expected: "list",
                    found: other.kind(),
                })
            }
        }
        self.refresh_memo(idx);
        Ok(())
    }

    fn set_items_on_top(
        &mut self,
        opcode: &'static str,
        items: Vec<Value>,
    ) -> Result<(), DecodeReason> {
        let idx = self.top_index()?;
        match &mut self.stack[idx].slot {
            Slot::Value(Value::Dict(entries)) => insert_pairs(opcode, entries, items)?,
            other => {
                return Err(DecodeReason::UnexpectedOperand {
                    opcode,
                    expected: "dict",
                    found: other.kind(),
                })
            }
        }
        self.refresh_memo(idx);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Memo
    // ---------------------------------------------------------------------

    fn memoize(&mut self, id: u32) -> Result<(), DecodeReason> {
        let idx = self.top_index()?;
        self.stack[idx].memo = Some(id);
        self.memo.insert(id, self.stack[idx].slot.clone());
        Ok(())
    }

    fn recall(&mut self, id: u32) -> Result<(), DecodeReason> {
        let slot = self.memo.get(&id).cloned().ok_or(DecodeReason::MemoMiss(id))?;
        self.stack.push(Entry {
            slot,
            memo: Some(id),
        });
        Ok(())
    }

    fn refresh_memo(&mut self, idx: usize) {
        if let Some(id) = self.stack[idx].memo {
            self.memo.insert(id, self.stack[idx].slot.clone());
        }
    }
}

fn into_value(opcode: &'static str, slot: Slot) -> Result<Value, DecodeReason> {
    match slot {
        Slot::Value(value) => Ok(value),
        Slot::Class(_) => Err(DecodeReason::UnexpectedOperand {
            opcode,
            expected: "value",
            found: "class",
        }),
    }
}

/// Insert alternating key/value items, replacing existing keys in place.
fn insert_pairs(
    opcode: &'static str,
    entries: &mut Vec<(String, Value)>,
    items: Vec<Value>,
) -> Result<(), DecodeReason> {
    if items.len() % 2 != 0 {
        return Err(DecodeReason::StackUnderflow);
    }
    let mut items = items.into_iter();
    while let (Some(key), Some(value)) = (items.next(), items.next()) {
        let Value::Str(key) = key else {
            return Err(DecodeReason::UnexpectedOperand {
                opcode,
                expected: "str key",
                found: key.kind(),
            });
        };
        match entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => entries.push((key, value)),
        }
    }
    Ok(())
}

fn reduce(class: String, args: Vec<Value>) -> Value {
    if SET_CLASSES.contains(&class.as_str()) {
        match args.as_slice() {
            [] => return Value::List(Vec::new()),
            [Value::List(items)] => return Value::List(items.clone()),
            _ => {}
        }
    }

    // protocol 2 pickles `bytes` as `_codecs.encode(text, "latin1")`
    if class == "_codecs.encode" {
        if let [Value::Str(text), Value::Str(encoding)] = args.as_slice() {
            if matches!(encoding.as_str(), "latin1" | "latin-1") {
                if let Some(bytes) = latin1_bytes(text) {
                    return Value::Bytes(bytes);
                }
            }
        }
    }

    Value::Object { class, args }
}

fn latin1_bytes(text: &str) -> Option<Vec<u8>> {
    text.chars().map(|c| u8::try_from(u32::from(c)).ok()).collect()
}

fn parse_int(text: &str) -> Result<i64, DecodeReason> {
    text.trim().parse::<i64>().map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => DecodeReason::IntegerOverflow,
        _ => DecodeReason::InvalidLiteral(text.to_string()),
    })
}

/// Little-endian two's complement, as written by `LONG1`/`LONG4`.
fn decode_long(bytes: &[u8]) -> Result<i64, DecodeReason> {
    let Some(&last) = bytes.last() else {
        return Ok(0);
    };
    let negative = last & 0x80 != 0;
    let fill = if negative { 0xff } else { 0x00 };
    let mut buf = [fill; 8];

    if bytes.len() > 8 {
        let (low, high) = bytes.split_at(8);
        if high.iter().any(|&b| b != fill) || (low[7] & 0x80 != 0) != negative {
            return Err(DecodeReason::IntegerOverflow);
        }
        buf.copy_from_slice(low);
    } else {
        buf[..bytes.len()].copy_from_slice(bytes);
    }

    Ok(i64::from_le_bytes(buf))
}

fn text_or_bytes(bytes: Vec<u8>) -> Value {
    match String::from_utf8(bytes) {
        Ok(text) => Value::Str(text),
        Err(e) => Value::Bytes(e.into_bytes()),
    }
}

/// Strip the quotes of a protocol 0 `STRING` literal and resolve escapes.
fn unquote(line: &[u8]) -> Result<Vec<u8>, DecodeReason> {
    let invalid = || DecodeReason::InvalidLiteral(String::from_utf8_lossy(line).into_owned());

    let [quote @ (b'\'' | b'"'), inner @ .., end] = line else {
        return Err(invalid());
    };
    if quote != end {
        return Err(invalid());
    }

    let mut out = Vec::with_capacity(inner.len());
    let mut i = 0;
    while i < inner.len() {
        let b = inner[i];
        i += 1;
        if b != b'\\' {
            out.push(b);
            continue;
        }
        let Some(&esc) = inner.get(i) else {
            return Err(invalid());
        };
        i += 1;
        match esc {
            b'n' => out.push(b'\n'),
            b't' => out.push(b'\t'),
            b'r' => out.push(b'\r'),
            b'0'..=b'7' => {
                let start = i - 1;
                let end = (start + 3).min(inner.len());
                let digits = inner[start..end]
                    .iter()
                    .take_while(|d| (b'0'..=b'7').contains(*d))
                    .count();
                let text = std::str::from_utf8(&inner[start..start + digits]).map_err(|_| invalid())?;
                let n = u8::from_str_radix(text, 8).map_err(|_| invalid())?;
                out.push(n);
                i = start + digits;
            }
            b'x' => {
                let hex = inner.get(i..i + 2).ok_or_else(invalid)?;
                let text = std::str::from_utf8(hex).map_err(|_| invalid())?;
                out.push(u8::from_str_radix(text, 16).map_err(|_| invalid())?);
                i += 2;
            }
            b'\\' | b'\'' | b'"' => out.push(esc),
            other => {
                out.push(b'\\');
                out.push(other);
            }
        }
    }
    Ok(out)
}

/// Decode Python's `raw-unicode-escape`: latin-1 bytes plus `\uXXXX` and
/// `\UXXXXXXXX` escapes.
fn raw_unicode_unescape(line: &[u8]) -> Result<String, DecodeReason> {
    let mut out = String::with_capacity(line.len());
    let mut i = 0;
    while i < line.len() {
        let b = line[i];
        let width = match (b, line.get(i + 1)) {
            (b'\\', Some(b'u')) => 4,
            (b'\\', Some(b'U')) => 8,
            _ => 0,
        };
        if width == 0 {
            out.push(char::from(b));
            i += 1;
            continue;
        }
        let invalid = || DecodeReason::InvalidLiteral(String::from_utf8_lossy(line).into_owned());
        let hex = line.get(i + 2..i + 2 + width).ok_or_else(invalid)?;
        let text = std::str::from_utf8(hex).map_err(|_| invalid())?;
        let code = u32::from_str_radix(text, 16).map_err(|_| invalid())?;
        out.push(char::from_u32(code).ok_or_else(invalid)?);
        i += 2 + width;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Fixtures produced by CPython's `pickle.dumps`.
    const PONG_P0: &[u8] = b"(I0\x0aVpong\x0ap0\x0atp1\x0a.";
    const PONG_P2: &[u8] = b"\x80\x02K\x00X\x04\x00\x00\x00pongq\x00\x86q\x01.";
    const PONG_P4: &[u8] =
        b"\x80\x04\x95\x0c\x00\x00\x00\x00\x00\x00\x00K\x00\x8c\x04pong\x94\x86\x94.";
    const STATUS_P4: &[u8] = b"\x80\x04\x95;\x00\x00\x00\x00\x00\x00\x00K\x00]\x94(\x8c\x0eNumber of jail\x94K\x02\x86\x94\x8c\x09Jail list\x94\x8c\x0csshd, apache\x94\x86\x94e\x86\x94.";
    const JAIL_P4: &[u8] = b"\x80\x04\x95\xea\x00\x00\x00\x00\x00\x00\x00K\x00]\x94(\x8c\x06Filter\x94]\x94(\x8c\x10Currently failed\x94K\x02\x86\x94\x8c\x0cTotal failed\x94K\x0a\x86\x94\x8c\x09File list\x94]\x94\x8c\x11/var/log/auth.log\x94a\x86\x94e\x86\x94\x8c\x07Actions\x94]\x94(\x8c\x10Currently banned\x94K\x01\x86\x94\x8c\x0cTotal banned\x94K\x05\x86\x94\x8c\x0eBanned IP list\x94]\x94\x8c\x15fail2ban.server.ipdns\x94\x8c\x06IPAddr\x94\x93\x94\x8c\x09192.0.2.1\x94\x85\x94R\x94a\x86\x94e\x86\x94e\x86\x94.";
    const BANNED_P4: &[u8] = b"\x80\x04\x95C\x00\x00\x00\x00\x00\x00\x00K\x00]\x94(}\x94\x8c\x04sshd\x94]\x94(\x8c\x09192.0.2.1\x94\x8c\x0c198.51.100.2\x94es}\x94\x8c\x06apache\x94]\x94h\x04ase\x86\x94.";
    const ERROR_P4: &[u8] = b"\x80\x04\x95A\x00\x00\x00\x00\x00\x00\x00K\x01\x8c\x15fail2ban.server.jails\x94\x8c\x14UnknownJailException\x94\x93\x94\x8c\x04nope\x94\x85\x94R\x94\x86\x94.";
    const SCALARS_P0: &[u8] = b"(I01\x0aI00\x0aNI-7\x0aF1.5\x0aVcaf\xe9\x0ap0\x0atp1\x0a.";
    const SCALARS_P2: &[u8] = b"\x80\x02(\x88\x89NJ\x90\xee\xfe\xff\x8a\x05\x00^\xd0\xb2\x00G?\xf8\x00\x00\x00\x00\x00\x00X\x05\x00\x00\x00caf\xc3\xa9q\x00c_codecs\x0aencode\x0aq\x01X\x03\x00\x00\x00\x00\xc3\xbfq\x02X\x06\x00\x00\x00latin1q\x03\x86q\x04Rq\x05tq\x06.";
    const BIG_P2: &[u8] = b"\x80\x02\x8a\x09\x00\x00\x00\x00\x00\x00\x00\x00@.";
    const SET_P2: &[u8] = b"\x80\x02c__builtin__\x0aset\x0aq\x00]q\x01X\x01\x00\x00\x00aq\x02a\x85q\x03Rq\x04\x85q\x05.";
    const SET_P4: &[u8] =
        b"\x80\x04\x95\x0e\x00\x00\x00\x00\x00\x00\x00\x8f\x94(\x8c\x01a\x94\x90(\x91\x94\x86\x94.";
    const SHARED_P2: &[u8] = b"\x80\x02]q\x00(]q\x01X\x01\x00\x00\x00aq\x02ah\x01e.";

    fn s(text: &str) -> Value {
        Value::from(text)
    }

    fn pair(label: &str, value: Value) -> Value {
        Value::Tuple(vec![s(label), value])
    }

    #[test]
    fn test_pong_across_protocols() {
        let expected = Value::Tuple(vec![Value::Int(0), s("pong")]);
        for bytes in [PONG_P0, PONG_P2, PONG_P4] {
            assert_eq!(decode(bytes).unwrap(), expected);
        }
    }

    #[test]
    fn test_status_reply() {
        let expected = Value::Tuple(vec![
            Value::Int(0),
            Value::List(vec![
                pair("Number of jail", Value::Int(2)),
                pair("Jail list", s("sshd, apache")),
            ]),
        ]);
        assert_eq!(decode(STATUS_P4).unwrap(), expected);
    }

    #[test]
    fn test_jail_status_with_ipaddr_objects() {
        let value = decode(JAIL_P4).unwrap();
        let expected = Value::Tuple(vec![
            Value::Int(0),
            Value::List(vec![
                pair(
                    "Filter",
                    Value::List(vec![
                        pair("Currently failed", Value::Int(2)),
                        pair("Total failed", Value::Int(10)),
                        pair("File list", Value::List(vec![s("/var/log/auth.log")])),
                    ]),
                ),
                pair(
                    "Actions",
                    Value::List(vec![
                        pair("Currently banned", Value::Int(1)),
                        pair("Total banned", Value::Int(5)),
                        pair(
                            "Banned IP list",
                            Value::List(vec![Value::Object {
                                class: "fail2ban.server.ipdns.IPAddr".into(),
                                args: vec![s("192.0.2.1")],
                            }]),
                        ),
                    ]),
                ),
            ]),
        ]);
        assert_eq!(value, expected);
    }

    #[test]
    fn test_banned_reply_with_memo_reference() {
        let value = decode(BANNED_P4).unwrap();
        let expected = Value::Tuple(vec![
            Value::Int(0),
            Value::List(vec![
                Value::Dict(vec![(
                    "sshd".into(),
                    Value::List(vec![s("192.0.2.1"), s("198.51.100.2")]),
                )]),
                Value::Dict(vec![("apache".into(), Value::List(vec![s("192.0.2.1")]))]),
            ]),
        ]);
        assert_eq!(value, expected);
    }

    #[test]
    fn test_exception_payload() {
        let value = decode(ERROR_P4).unwrap();
        assert_eq!(
            value,
            Value::Tuple(vec![
                Value::Int(1),
                Value::Object {
                    class: "fail2ban.server.jails.UnknownJailException".into(),
                    args: vec![s("nope")],
                },
            ])
        );
    }

    #[test]
    fn test_scalars_protocol_0() {
        assert_eq!(
            decode(SCALARS_P0).unwrap(),
            Value::Tuple(vec![
                Value::Bool(true),
                Value::Bool(false),
                Value::None,
                Value::Int(-7),
                Value::Float(1.5),
                s("café"),
            ])
        );
    }

    #[test]
    fn test_scalars_protocol_2() {
        assert_eq!(
            decode(SCALARS_P2).unwrap(),
            Value::Tuple(vec![
                Value::Bool(true),
                Value::Bool(false),
                Value::None,
                Value::Int(-70_000),
                Value::Int(3_000_000_000),
                Value::Float(1.5),
                s("café"),
                Value::Bytes(vec![0x00, 0xff]),
            ])
        );
    }

    #[test]
    fn test_sets_decode_to_lists() {
        assert_eq!(
            decode(SET_P2).unwrap(),
            Value::Tuple(vec![Value::List(vec![s("a")])])
        );
        assert_eq!(
            decode(SET_P4).unwrap(),
            Value::Tuple(vec![Value::List(vec![s("a")]), Value::List(vec![])])
        );
    }

    #[test]
    fn test_memo_sees_later_appends() {
        let inner = Value::List(vec![s("a")]);
        assert_eq!(
            decode(SHARED_P2).unwrap(),
            Value::List(vec![inner.clone(), inner])
        );
    }

    #[test]
    fn test_integer_overflow() {
        let err = decode(BIG_P2).unwrap_err();
        assert_eq!(err.reason, DecodeReason::IntegerOverflow);
        assert_eq!(err.offset, 2);
    }

    #[test]
    fn test_long_sign_extension() {
        assert_eq!(decode_long(&[]).unwrap(), 0);
        assert_eq!(decode_long(&[0xff]).unwrap(), -1);
        assert_eq!(decode_long(&[0x00, 0x80]).unwrap(), 32768);
        assert_eq!(
            decode_long(&[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]).unwrap(),
            -1
        );
    }

    #[test]
    fn test_truncated_stream_keeps_consumed_bytes() {
        let cut = &STATUS_P4[..30];
        let err = decode(cut).unwrap_err();
        assert!(matches!(err.reason, DecodeReason::Truncated { .. }));
        assert_eq!(err.consumed, cut[..err.consumed.len()].to_vec());
        assert!(err.consumed.len() <= cut.len());
        assert!(err.consumed.starts_with(b"\x80\x04"));
    }

    #[test]
    fn test_missing_stop_is_truncation() {
        let err = decode(&PONG_P2[..PONG_P2.len() - 1]).unwrap_err();
        assert_eq!(err.reason, DecodeReason::Truncated { need: 1, have: 0 });
        assert_eq!(err.consumed.len(), PONG_P2.len() - 1);
    }

    #[test]
    fn test_unknown_opcode() {
        let err = decode(b"\x80\x02\xff.").unwrap_err();
        assert_eq!(err.reason, DecodeReason::UnknownOpcode(0xff));
        assert_eq!(err.offset, 2);
        assert_eq!(err.consumed, b"\x80\x02\xff".to_vec());
    }

    #[test]
    fn test_structural_errors() {
        assert_eq!(decode(b".").unwrap_err().reason, DecodeReason::EmptyResult);
        assert_eq!(decode(b"t.").unwrap_err().reason, DecodeReason::MissingMark);
        assert_eq!(decode(b"h\x07.").unwrap_err().reason, DecodeReason::MemoMiss(7));
        assert_eq!(decode(b"\x80\x09N.").unwrap_err().reason, DecodeReason::UnsupportedProtocol(9));
        // APPEND onto an int
        assert!(matches!(
            decode(b"K\x01K\x02a.").unwrap_err().reason,
            DecodeReason::UnexpectedOperand { opcode: "APPEND", .. }
        ));
        // non-string dict key
        assert!(matches!(
            decode(b"}K\x01K\x02s.").unwrap_err().reason,
            DecodeReason::UnexpectedOperand { expected: "str key", .. }
        ));
    }

    #[test]
    fn test_duplicate_dict_keys_replace_in_place() {
        // {'a': 1, 'b': 2, 'a': 3} built by hand with SETITEMS
        let bytes = b"}(X\x01\x00\x00\x00aK\x01X\x01\x00\x00\x00bK\x02X\x01\x00\x00\x00aK\x03u.";
        assert_eq!(
            decode(bytes).unwrap(),
            Value::Dict(vec![("a".into(), Value::Int(3)), ("b".into(), Value::Int(2))])
        );
    }

    #[test]
    fn test_protocol_0_string_escapes() {
        assert_eq!(unquote(br"'a\nb\x41\101\\'").unwrap(), b"a\nbAA\\".to_vec());
        assert!(unquote(b"'unterminated").is_err());
        assert_eq!(
            raw_unicode_unescape(b"caf\xe9 \\U0001F600").unwrap(),
            "caf\u{e9} \u{1F600}"
        );
    }
}
