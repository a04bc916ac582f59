//! Named attributes on vertices and faces.
//!
//! Each vertex and face carries a small typed key-value bag. The mesh keeps a
//! table of default values per element kind, and lookups fall back to that
//! table when an element has no value of its own.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Boolean flag, e.g. `is_fixed`.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating point value, e.g. a load component.
    Float(f64),
    /// Free-form text.
    Text(String),
    /// List of floats, e.g. a force vector.
    List(Vec<f64>),
}

impl AttributeValue {
    /// The value as a bool, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The value as an integer, if it is one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttributeValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// The value as a float. Integers are widened.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            AttributeValue::Float(x) => Some(*x),
            AttributeValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// The value as a string slice, if it is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The value as a float slice, if it is a list.
    pub fn as_list(&self) -> Option<&[f64]> {
        match self {
            AttributeValue::List(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Bool(b) => write!(f, "{}", b),
            AttributeValue::Int(i) => write!(f, "{}", i),
            AttributeValue::Float(x) => write!(f, "{}", x),
            AttributeValue::Text(s) => write!(f, "{:?}", s),
            AttributeValue::List(v) => write!(f, "{:?}", v),
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        AttributeValue::Bool(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Int(v)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Float(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::Text(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::Text(v)
    }
}

impl From<Vec<f64>> for AttributeValue {
    fn from(v: Vec<f64>) -> Self {
        AttributeValue::List(v)
    }
}

/// An attribute bag: attribute name to value.
pub type Attributes = BTreeMap<String, AttributeValue>;

/// Build an [`Attributes`] bag from name/value pairs.
///
/// ```
/// use meshwork::mesh::attributes;
///
/// let attr = attributes([("is_fixed", true.into()), ("px", 0.5.into())]);
/// assert_eq!(attr.len(), 2);
/// ```
pub fn attributes<'a, It>(pairs: It) -> Attributes
where
    It: IntoIterator<Item = (&'a str, AttributeValue)>,
{
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

/// Look up `name` in `own`, falling back to `defaults`.
pub(crate) fn lookup<'a>(
    own: &'a Attributes,
    defaults: &'a Attributes,
    name: &str,
) -> Option<&'a AttributeValue> {
    own.get(name).or_else(|| defaults.get(name))
}
