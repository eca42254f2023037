//! Positional query arguments.

use serde::Serialize;
use sqlx::mysql::{MySql, MySqlArguments};
use sqlx::query::Query;

/// A value bound to a `?` placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DbValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl From<bool> for DbValue {
    fn from(v: bool) -> Self {
        DbValue::Bool(v)
    }
}

impl From<i32> for DbValue {
    fn from(v: i32) -> Self {
        DbValue::Int(i64::from(v))
    }
}

impl From<i64> for DbValue {
    fn from(v: i64) -> Self {
        DbValue::Int(v)
    }
}

impl From<u32> for DbValue {
    fn from(v: u32) -> Self {
        DbValue::UInt(u64::from(v))
    }
}

impl From<u64> for DbValue {
    fn from(v: u64) -> Self {
        DbValue::UInt(v)
    }
}

impl From<f64> for DbValue {
    fn from(v: f64) -> Self {
        DbValue::Float(v)
    }
}

impl From<&str> for DbValue {
    fn from(v: &str) -> Self {
        DbValue::Text(v.to_string())
    }
}

impl From<String> for DbValue {
    fn from(v: String) -> Self {
        DbValue::Text(v)
    }
}

impl From<Vec<u8>> for DbValue {
    fn from(v: Vec<u8>) -> Self {
        DbValue::Bytes(v)
    }
}

impl<T: Into<DbValue>> From<Option<T>> for DbValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(DbValue::Null, Into::into)
    }
}

/// Bind `args` in order.
pub(crate) fn bind_all<'q>(
    mut query: Query<'q, MySql, MySqlArguments>,
    args: &'q [DbValue],
) -> Query<'q, MySql, MySqlArguments> {
    for arg in args {
        query = match arg {
            DbValue::Null => query.bind(None::<String>),
            DbValue::Bool(v) => query.bind(*v),
            DbValue::Int(v) => query.bind(*v),
            DbValue::UInt(v) => query.bind(*v),
            DbValue::Float(v) => query.bind(*v),
            DbValue::Text(v) => query.bind(v.as_str()),
            DbValue::Bytes(v) => query.bind(v.as_slice()),
        };
    }
    query
}

/// Arguments as a JSON array for telemetry.
pub(crate) fn render_args(args: &[DbValue]) -> String {
    serde_json::to_string(args).unwrap_or_else(|_| "[]".to_string())
}
