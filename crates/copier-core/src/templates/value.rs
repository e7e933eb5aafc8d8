//! Closed document model for YAML loaded from templates and answers files
//!
//! `serde_yaml::Value` is converted into [`DocValue`] before any inspection so
//! that type inference matches exhaustively over the six shapes a document
//! can take.

use serde_yaml::Value;
use std::fmt;

/// A loaded YAML node
#[derive(Debug, Clone, PartialEq)]
pub enum DocValue {
    Null,
    Bool(bool),
    Number(serde_yaml::Number),
    String(String),
    Sequence(Vec<DocValue>),
    /// Entries in document order; keys are stringified
    Mapping(Vec<(String, DocValue)>),
}

impl DocValue {
    /// Look up a key in a mapping node
    pub fn get(&self, key: &str) -> Option<&DocValue> {
        match self {
            DocValue::Mapping(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DocValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&[(String, DocValue)]> {
        match self {
            DocValue::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[DocValue]> {
        match self {
            DocValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DocValue::Null)
    }
}

impl From<Value> for DocValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => DocValue::Null,
            Value::Bool(b) => DocValue::Bool(b),
            Value::Number(n) => DocValue::Number(n),
            Value::String(s) => DocValue::String(s),
            Value::Sequence(items) => {
                DocValue::Sequence(items.into_iter().map(DocValue::from).collect())
            }
            Value::Mapping(map) => DocValue::Mapping(
                map.into_iter()
                    .map(|(k, v)| (DocValue::from(k).to_string(), DocValue::from(v)))
                    .collect(),
            ),
            // Custom tags (`!env FOO`) carry no meaning for us; keep the payload.
            Value::Tagged(tagged) => DocValue::from(tagged.value),
        }
    }
}

/// Flat rendering used for defaults and choices
///
/// Scalars print bare, `null` prints empty, collections use YAML flow style.
impl fmt::Display for DocValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocValue::Null => Ok(()),
            DocValue::Bool(b) => write!(f, "{}", b),
            DocValue::Number(n) => write!(f, "{}", n),
            DocValue::String(s) => f.write_str(s),
            DocValue::Sequence(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            DocValue::Mapping(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                f.write_str("}")
            }
        }
    }
}
