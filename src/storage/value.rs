//! Attribute values and items as exchanged with the store.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A stored record: attribute name to value.
pub type Item = BTreeMap<String, AttributeValue>;

/// A typed attribute value.
///
/// Numbers are carried as their decimal string so that 64-bit geohashes keep
/// full precision on their way through any store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeValue {
    S(String),
    N(String),
    B(Bytes),
    Bool(bool),
    Null,
    L(Vec<AttributeValue>),
    M(BTreeMap<String, AttributeValue>),
}

impl AttributeValue {
    pub fn as_s(&self) -> Option<&str> {
        match self {
            Self::S(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_n(&self) -> Option<&str> {
        match self {
            Self::N(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.as_n().and_then(|n| n.parse().ok())
    }

    pub fn as_b(&self) -> Option<&Bytes> {
        match self {
            Self::B(b) => Some(b),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::S(_) => "S",
            Self::N(_) => "N",
            Self::B(_) => "B",
            Self::Bool(_) => "BOOL",
            Self::Null => "NULL",
            Self::L(_) => "L",
            Self::M(_) => "M",
        }
    }

    /// Plain JSON view of the value. Numbers that do not parse fall back to strings,
    /// binary values become arrays of bytes.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            Self::S(s) => Value::String(s.clone()),
            Self::N(n) => parse_json_number(n).unwrap_or_else(|| Value::String(n.clone())),
            Self::B(b) => Value::Array(b.iter().map(|byte| Value::from(*byte)).collect()),
            Self::Bool(b) => Value::Bool(*b),
            Self::Null => Value::Null,
            Self::L(values) => Value::Array(values.iter().map(Self::to_json).collect()),
            Self::M(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    pub fn from_json(value: &serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => Self::N(n.to_string()),
            Value::String(s) => Self::S(s.clone()),
            Value::Array(values) => Self::L(values.iter().map(Self::from_json).collect()),
            Value::Object(map) => Self::M(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }
}

fn parse_json_number(n: &str) -> Option<serde_json::Value> {
    if let Ok(u) = n.parse::<u64>() {
        return Some(u.into());
    }
    if let Ok(i) = n.parse::<i64>() {
        return Some(i.into());
    }
    n.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(serde_json::Value::Number)
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        Self::S(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        Self::S(s)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Bytes> for AttributeValue {
    fn from(b: Bytes) -> Self {
        Self::B(b)
    }
}

macro_rules! number_from {
    ($($t:ty),*) => {
        $(impl From<$t> for AttributeValue {
            fn from(n: $t) -> Self {
                Self::N(n.to_string())
            }
        })*
    };
}

number_from!(u8, u16, u32, u64, i8, i16, i32, i64, usize, f32, f64);

/// Post-read predicate evaluated by the store after the page limit is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Filter {
    Equals {
        attribute: String,
        value: AttributeValue,
    },
    Exists(String),
    NotExists(String),
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn equals(attribute: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self::Equals {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, item: &Item) -> bool {
        match self {
            Self::Equals { attribute, value } => item.get(attribute) == Some(value),
            Self::Exists(attribute) => item.contains_key(attribute),
            Self::NotExists(attribute) => !item.contains_key(attribute),
            Self::And(filters) => filters.iter().all(|f| f.matches(item)),
            Self::Or(filters) => filters.iter().any(|f| f.matches(item)),
        }
    }
}
