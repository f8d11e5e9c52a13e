//! Typed field values.

use bytes::Bytes;
use serde::ser::{Error as _, Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use string_cache::DefaultAtom as Atom;

/// Wire tokens for the verification placeholders. These never appear in real
/// sensor output; parsing captured output cannot produce the placeholder
/// variants, so the tokens only ever show up when a normalized record is
/// printed for diagnostics.
const NORMALIZED_INT_TOKEN: &str = "<normalized-int>";
const NORMALIZED_STR_TOKEN: &str = "<normalized-str>";

/// The value of one record field.
///
/// `NormalizedInt` and `NormalizedStr` are verification-path placeholders:
/// writing one over a volatile field makes the field match any well-typed
/// value during comparison. They are reserved vocabulary of the matching
/// engine and are never produced by the decoding or enrichment stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A signed integer (return codes, PIDs).
    Integer(i64),
    /// An unsigned integer (timestamps, namespace ids, bitmasks).
    Unsigned(u64),
    /// A UTF-8 string payload.
    Bytes(Bytes),
    /// A nested block of named fields.
    Map(BTreeMap<Atom, Value>),
    /// Placeholder matching any integer value.
    NormalizedInt,
    /// Placeholder matching any string value.
    NormalizedStr,
}

impl Value {
    /// Build a nested block from `(name, value)` pairs.
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Atom>,
        V: Into<Value>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    /// Whether every string payload in this value is valid UTF-8.
    pub fn is_valid_utf8(&self) -> bool {
        match self {
            Value::Bytes(bytes) => std::str::from_utf8(bytes).is_ok(),
            Value::Map(map) => map.values().all(Value::is_valid_utf8),
            _ => true,
        }
    }

    /// A short name for the value's shape, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Unsigned(_) => "unsigned integer",
            Value::Bytes(_) => "string",
            Value::Map(_) => "nested block",
            Value::NormalizedInt => "normalized integer",
            Value::NormalizedStr => "normalized string",
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Integer(value) => serializer.serialize_i64(*value),
            Value::Unsigned(value) => serializer.serialize_u64(*value),
            Value::Bytes(bytes) => match std::str::from_utf8(bytes) {
                Ok(string) => serializer.serialize_str(string),
                Err(_) => Err(S::Error::custom("string value is not valid UTF-8")),
            },
            Value::Map(map) => {
                let mut entries = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    entries.serialize_entry(key, value)?;
                }
                entries.end()
            }
            Value::NormalizedInt => serializer.serialize_str(NORMALIZED_INT_TOKEN),
            Value::NormalizedStr => serializer.serialize_str(NORMALIZED_STR_TOKEN),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(value) => write!(f, "{}", value),
            Value::Unsigned(value) => write!(f, "{}", value),
            Value::Bytes(bytes) => write!(f, "{:?}", String::from_utf8_lossy(bytes)),
            Value::Map(map) => {
                f.write_str("{")?;
                for (index, (key, value)) in map.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                f.write_str("}")
            }
            Value::NormalizedInt => f.write_str("<any integer>"),
            Value::NormalizedStr => f.write_str("<any string>"),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Unsigned(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Unsigned(value.into())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Bytes(Bytes::copy_from_slice(value.as_bytes()))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Bytes(Bytes::from(value))
    }
}

impl From<Bytes> for Value {
    fn from(value: Bytes) -> Self {
        Value::Bytes(value)
    }
}

impl From<BTreeMap<Atom, Value>> for Value {
    fn from(value: BTreeMap<Atom, Value>) -> Self {
        Value::Map(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_scalars() {
        let cases = [
            (Value::from(-2), "-2"),
            (Value::from(1234u64), "1234"),
            (Value::from("mount"), r#""mount""#),
        ];

        for (value, expected) in cases {
            assert_eq!(serde_json::to_string(&value).unwrap(), expected);
        }
    }

    #[test]
    fn serializes_nested_blocks() {
        let value = Value::map([("container_name", "test-trace-mount")]);
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"container_name":"test-trace-mount"}"#
        );
    }

    #[test]
    fn rejects_non_utf8_strings() {
        let value = Value::Bytes(Bytes::from_static(&[0xff, 0xfe]));
        assert!(!value.is_valid_utf8());
        assert!(serde_json::to_string(&value).is_err());

        let nested = Value::map([("data", value)]);
        assert!(!nested.is_valid_utf8());
    }

    #[test]
    fn displays_placeholders_distinctly() {
        assert_eq!(Value::NormalizedInt.to_string(), "<any integer>");
        assert_eq!(Value::NormalizedStr.to_string(), "<any string>");
        assert_eq!(Value::from("mount").to_string(), r#""mount""#);
    }
}
