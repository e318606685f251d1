//! Semantic scalar types and cell values
//!
//! Columns are declared with one of five semantic types:
//! - `Integer`: 64-bit signed integers
//! - `Float`: 64-bit floating point
//! - `Text`: UTF-8 strings
//! - `Boolean`: stored as 0/1
//! - `DateTime`: naive timestamps stored as ISO-8601 text, with as many
//!   fractional digits (none, 6 or 9) as needed to keep the value exact

use crate::{Error, Result};
use chrono::NaiveDateTime;
use rusqlite::types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Storage format for `DateTime` values, matching SQLite's date functions.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Semantic column types.
///
/// Each type maps to exactly one SQLite column type through [`ColumnType::sql_type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ColumnType {
    Integer,
    Float,
    Text,
    Boolean,
    DateTime,
}

impl ColumnType {
    /// Get the string representation of the column type
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Text => "text",
            ColumnType::Boolean => "boolean",
            ColumnType::DateTime => "datetime",
        }
    }

    /// The SQLite type name used in `CREATE TABLE` statements.
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Float => "REAL",
            ColumnType::Text => "TEXT",
            ColumnType::Boolean => "INTEGER",
            ColumnType::DateTime => "TIMESTAMP",
        }
    }

    /// Get all column types
    pub fn all() -> &'static [ColumnType] {
        &[
            ColumnType::Integer,
            ColumnType::Float,
            ColumnType::Text,
            ColumnType::Boolean,
            ColumnType::DateTime,
        ]
    }
}

impl FromStr for ColumnType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "integer" | "int" | "int64" | "i64" | "bigint" => Ok(ColumnType::Integer),
            "float" | "float64" | "f64" | "real" | "double" => Ok(ColumnType::Float),
            "text" | "str" | "string" | "object" => Ok(ColumnType::Text),
            "boolean" | "bool" => Ok(ColumnType::Boolean),
            "datetime" | "datetime64" | "timestamp" => Ok(ColumnType::DateTime),
            _ => Err(Error::SchemaConflict(format!("unsupported column type: {}", s))),
        }
    }
}

impl TryFrom<String> for ColumnType {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single cell of a row batch.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
    DateTime(NaiveDateTime),
}

impl Value {
    /// Short name of the value's variant, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Boolean(_) => "boolean",
            Value::DateTime(_) => "datetime",
        }
    }

    /// Whether this value may be stored in a column of type `ty`.
    ///
    /// Nulls conform to every type; integers widen into float columns.
    /// Key columns additionally reject nulls, see [`crate::RowBatch`].
    pub fn conforms_to(&self, ty: ColumnType) -> bool {
        matches!(
            (self, ty),
            (Value::Null, _)
                | (Value::Integer(_), ColumnType::Integer)
                | (Value::Integer(_), ColumnType::Float)
                | (Value::Float(_), ColumnType::Float)
                | (Value::Text(_), ColumnType::Text)
                | (Value::Boolean(_), ColumnType::Boolean)
                | (Value::DateTime(_), ColumnType::DateTime)
        )
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// Render a timestamp the way it is stored.
///
/// Whole seconds carry no fraction and microsecond values keep six digits;
/// anything finer keeps all nine, so distinct timestamps never share a key.
pub fn format_datetime(dt: &NaiveDateTime) -> String {
    use chrono::Timelike;
    match dt.nanosecond() {
        0 => dt.format(DATETIME_FORMAT).to_string(),
        n if n % 1_000 == 0 => dt.format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
        _ => dt.format("%Y-%m-%d %H:%M:%S%.9f").to_string(),
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
            Value::Integer(i) => ToSqlOutput::Owned(SqlValue::Integer(*i)),
            Value::Float(f) => ToSqlOutput::Owned(SqlValue::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Boolean(b) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*b))),
            Value::DateTime(dt) => ToSqlOutput::Owned(SqlValue::Text(format_datetime(dt))),
        })
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "{}", s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::DateTime(dt) => write!(f, "{}", format_datetime(dt)),
        }
    }
}
