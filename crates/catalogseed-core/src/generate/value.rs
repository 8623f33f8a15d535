use std::borrow::Cow;

use chrono::{DateTime, Utc};

/// A generated value bound to one positional placeholder.
///
/// The `String` variant uses `Cow<'static, str>` so that values drawn from
/// the static word lists and status tables are held as `&'static str` borrows,
/// while templated values (titles, generated slugs) are owned. A product batch
/// binds 60,000 arguments, most of them short constants.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    String(Cow<'static, str>),
    Timestamp(DateTime<Utc>),
    Json(serde_json::Value),
}

impl Value {
    /// Wrap a dynamically generated string.
    #[inline]
    pub fn owned(s: String) -> Self {
        Value::String(Cow::Owned(s))
    }

    /// Wrap a static string (no heap allocation).
    #[inline]
    pub fn borrowed(s: &'static str) -> Self {
        Value::String(Cow::Borrowed(s))
    }

    /// Get a string representation for key comparison.
    pub fn to_unique_key(&self) -> String {
        match self {
            Value::Null => "__NULL__".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::String(s) => s.to_string(),
            Value::Timestamp(ts) => ts.to_rfc3339(),
            Value::Json(j) => j.to_string(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(ts: DateTime<Utc>) -> Self {
        Value::Timestamp(ts)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::String(s) => write!(f, "{}", s),
            Value::Timestamp(ts) => write!(f, "{}", ts),
            Value::Json(j) => write!(f, "{}", j),
        }
    }
}
