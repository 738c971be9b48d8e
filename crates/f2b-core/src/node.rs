//! Positional navigation over a [`Value`] tree.
//!
//! Every step asserts the expected tag and records the path it walked, so a
//! mismatch deep inside a response produces one [`ShapeError`] that says
//! exactly where the tree diverged, e.g. `$[1][0][1]: expected int, found str`.

use crate::error::ShapeError;
use crate::value::Value;

/// A value together with the path used to reach it.
#[derive(Debug, Clone)]
pub struct Node<'a> {
    value: &'a Value,
    path: String,
}

/// A tuple or list reached through [`Node::expect_tuple`] / [`Node::expect_list`].
#[derive(Debug, Clone)]
pub struct Seq<'a> {
    items: &'a [Value],
    path: String,
}

/// A dict reached through [`Node::expect_dict`].
#[derive(Debug, Clone)]
pub struct DictNode<'a> {
    entries: &'a [(String, Value)],
    path: String,
}

impl<'a> Node<'a> {
    /// Start navigating at the root of a decoded response.
    #[must_use]
    pub fn root(value: &'a Value) -> Self {
        Self {
            value,
            path: String::from("$"),
        }
    }

    /// The underlying value.
    #[must_use]
    pub const fn value(&self) -> &'a Value {
        self.value
    }

    /// Path from the root, e.g. `$[1][0]`.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    fn mismatch(&self, expected: impl Into<String>) -> ShapeError {
        ShapeError {
            path: self.path.clone(),
            expected: expected.into(),
            found: self.value.kind().to_string(),
        }
    }

    /// Assert a tuple of exactly `arity` elements.
    pub fn expect_tuple(&self, arity: usize) -> Result<Seq<'a>, ShapeError> {
        match self.value {
            Value::Tuple(items) if items.len() == arity => Ok(Seq {
                items,
                path: self.path.clone(),
            }),
            Value::Tuple(items) => Err(ShapeError {
                path: self.path.clone(),
                expected: format!("tuple of {arity}"),
                found: format!("tuple of {}", items.len()),
            }),
            _ => Err(self.mismatch(format!("tuple of {arity}"))),
        }
    }

    /// Assert a list of any length.
    pub fn expect_list(&self) -> Result<Seq<'a>, ShapeError> {
        match self.value {
            Value::List(items) => Ok(Seq {
                items,
                path: self.path.clone(),
            }),
            _ => Err(self.mismatch("list")),
        }
    }

    /// Assert a dict.
    pub fn expect_dict(&self) -> Result<DictNode<'a>, ShapeError> {
        match self.value {
            Value::Dict(entries) => Ok(DictNode {
                entries,
                path: self.path.clone(),
            }),
            _ => Err(self.mismatch("dict")),
        }
    }

    /// Assert a string.
    pub fn expect_str(&self) -> Result<&'a str, ShapeError> {
        match self.value {
            Value::Str(s) => Ok(s),
            _ => Err(self.mismatch("str")),
        }
    }

    /// Assert an integer.
    pub fn expect_int(&self) -> Result<i64, ShapeError> {
        match self.value {
            Value::Int(i) => Ok(*i),
            _ => Err(self.mismatch("int")),
        }
    }
}

impl<'a> Seq<'a> {
    /// Element at `index`; out of range is a shape error, never a panic.
    pub fn at(&self, index: usize) -> Result<Node<'a>, ShapeError> {
        self.items.get(index).map_or_else(
            || {
                Err(ShapeError {
                    path: format!("{}[{index}]", self.path),
                    expected: "element".to_string(),
                    found: format!("end of sequence (len {})", self.items.len()),
                })
            },
            |value| {
                Ok(Node {
                    value,
                    path: format!("{}[{index}]", self.path),
                })
            },
        )
    }

    /// Number of elements
    #[must_use]
    pub const fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the sequence is empty
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate over the elements in order.
    pub fn iter(&self) -> impl Iterator<Item = Node<'a>> + '_ {
        self.items.iter().enumerate().map(|(i, value)| Node {
            value,
            path: format!("{}[{i}]", self.path),
        })
    }
}

impl<'a> DictNode<'a> {
    /// Number of entries
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the dict is empty
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The only entry of a single-key dict.
    pub fn single_entry(&self) -> Result<(&'a str, Node<'a>), ShapeError> {
        match self.entries {
            [(key, value)] => Ok((
                key.as_str(),
                Node {
                    value,
                    path: format!("{}[{key:?}]", self.path),
                },
            )),
            _ => Err(ShapeError {
                path: self.path.clone(),
                expected: "single-key dict".to_string(),
                found: format!("dict of {}", self.entries.len()),
            }),
        }
    }

    /// Iterate over `(key, node)` pairs in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&'a str, Node<'a>)> + '_ {
        self.entries.iter().map(|(key, value)| {
            (
                key.as_str(),
                Node {
                    value,
                    path: format!("{}[{key:?}]", self.path),
                },
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_reply() -> Value {
        Value::Tuple(vec![
            Value::Int(0),
            Value::List(vec![
                Value::Tuple(vec![Value::from("Number of jail"), Value::Int(1)]),
                Value::Tuple(vec![Value::from("Jail list"), Value::from("sshd")]),
            ]),
        ])
    }

    #[test]
    fn test_navigate_fixed_path() {
        let value = status_reply();
        let root = Node::root(&value);
        let jails = root
            .expect_tuple(2)
            .and_then(|t| t.at(1))
            .and_then(|n| n.expect_list())
            .and_then(|l| l.at(1))
            .and_then(|n| n.expect_tuple(2))
            .and_then(|t| t.at(1))
            .and_then(|n| n.expect_str())
            .unwrap();
        assert_eq!(jails, "sshd");
    }

    #[test]
    fn test_mismatch_reports_path() {
        let value = status_reply();
        let err = Node::root(&value)
            .expect_tuple(2)
            .and_then(|t| t.at(1))
            .and_then(|n| n.expect_list())
            .and_then(|l| l.at(0))
            .and_then(|n| n.expect_tuple(2))
            .and_then(|t| t.at(1))
            .and_then(|n| n.expect_str())
            .unwrap_err();
        assert_eq!(err.path, "$[1][0][1]");
        assert_eq!(err.expected, "str");
        assert_eq!(err.found, "int");
    }

    #[test]
    fn test_wrong_arity() {
        let value = Value::Tuple(vec![Value::Int(0)]);
        let err = Node::root(&value).expect_tuple(2).unwrap_err();
        assert_eq!(err.expected, "tuple of 2");
        assert_eq!(err.found, "tuple of 1");
    }

    #[test]
    fn test_out_of_range_is_error() {
        let value = Value::List(vec![]);
        let list = Node::root(&value).expect_list().unwrap();
        assert!(list.is_empty());
        let err = list.at(3).unwrap_err();
        assert_eq!(err.path, "$[3]");
    }

    #[test]
    fn test_single_entry_dict() {
        let value = Value::Dict(vec![("sshd".into(), Value::List(vec![]))]);
        let dict = Node::root(&value).expect_dict().unwrap();
        let (key, node) = dict.single_entry().unwrap();
        assert_eq!(key, "sshd");
        assert_eq!(node.path(), r#"$["sshd"]"#);

        let two = Value::Dict(vec![("a".into(), Value::None), ("b".into(), Value::None)]);
        let err = Node::root(&two).expect_dict().unwrap().single_entry().unwrap_err();
        assert_eq!(err.found, "dict of 2");
    }
}
