//! The decoded value tree.

use std::fmt;

/// A decoded protocol payload.
///
/// Values are produced by [`crate::codec::decode`] and never mutated
/// afterwards. Containers keep the order in which the daemon serialised them.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Python `None`
    None,
    /// Boolean
    Bool(bool),
    /// Integer (anything wider than 64 bits is rejected by the decoder)
    Int(i64),
    /// Floating point number
    Float(f64),
    /// Text string
    Str(String),
    /// Raw byte string
    Bytes(Vec<u8>),
    /// Fixed-arity, positionally meaningful sequence
    Tuple(Vec<Value>),
    /// Variable-length sequence (Python lists and sets)
    List(Vec<Value>),
    /// Insertion-ordered mapping with unique string keys
    Dict(Vec<(String, Value)>),
    /// Opaque object rebuilt by the pickle `REDUCE`/`NEWOBJ` opcodes
    Object {
        /// Fully qualified class name, e.g. `fail2ban.server.ipdns.IPAddr`
        class: String,
        /// Constructor arguments
        args: Vec<Value>,
    },
}

impl Value {
    /// Short name of the variant, used in shape diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::Bytes(_) => "bytes",
            Self::Tuple(_) => "tuple",
            Self::List(_) => "list",
            Self::Dict(_) => "dict",
            Self::Object { .. } => "object",
        }
    }

    /// Returns the integer if this is an `Int`
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the string slice if this is a `Str`
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Looks up a key in a `Dict`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Self> {
        match self {
            Self::Dict(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Python-style repr, which is what operators see in fail2ban's own output.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Bool(true) => write!(f, "True"),
            Self::Bool(false) => write!(f, "False"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Bytes(b) => write!(f, "b{:?}", String::from_utf8_lossy(b)),
            Self::Tuple(items) => {
                write!(f, "(")?;
                write_items(f, items)?;
                if items.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Self::List(items) => {
                write!(f, "[")?;
                write_items(f, items)?;
                write!(f, "]")
            }
            Self::Dict(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k:?}: {v}")?;
                }
                write!(f, "}}")
            }
            Self::Object { class, args } => {
                write!(f, "{class}(")?;
                write_items(f, args)?;
                write!(f, ")")
            }
        }
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}
