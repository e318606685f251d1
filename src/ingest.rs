//! JSON batch files
//!
//! ```json
//! { "key": [{"name": "id", "type": "integer"}],
//!   "columns": [{"name": "name", "type": "text"}],
//!   "rows": [{"id": 1, "name": "a"}] }
//! ```
//!
//! Fields missing from a row are stored as NULL. An empty `key` gives the
//! batch an implicit positional index.

use crate::batch::RowBatch;
use crate::schema::Column;
use crate::types::{ColumnType, Value};
use crate::{Error, Result};
use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use serde_json::{Map, Value as Json};
use std::path::Path;

#[derive(Debug, Deserialize)]
struct BatchFile {
    #[serde(default)]
    key: Vec<Column>,
    #[serde(default)]
    columns: Vec<Column>,
    #[serde(default)]
    rows: Vec<Map<String, Json>>,
}

/// Parse a JSON batch document.
pub fn parse_batch(json: &str) -> Result<RowBatch> {
    let file: BatchFile =
        serde_json::from_str(json).map_err(|e| Error::MalformedBatch(format!("invalid batch document: {}", e)))?;

    let mut builder = file
        .key
        .iter()
        .fold(RowBatch::builder(), |b, c| b.key(c.name.clone(), c.ty));
    builder = file
        .columns
        .iter()
        .fold(builder, |b, c| b.column(c.name.clone(), c.ty));

    for (index, row) in file.rows.iter().enumerate() {
        if let Some(unknown) = row
            .keys()
            .find(|k| !file.key.iter().chain(file.columns.iter()).any(|c| &c.name == *k))
        {
            return Err(Error::MalformedBatch(format!("row {} has undeclared field {:?}", index, unknown)));
        }

        let values = file
            .key
            .iter()
            .chain(file.columns.iter())
            .map(|c| json_to_value(row.get(&c.name).unwrap_or(&Json::Null), c.ty).map_err(|e| at_row(e, index, &c.name)))
            .collect::<Result<Vec<_>>>()?;
        builder.push_row(values);
    }

    builder.build()
}

/// Read and parse a JSON batch file.
pub fn load_batch(path: &Path) -> Result<RowBatch> {
    let contents = std::fs::read_to_string(path)?;
    parse_batch(&contents)
}

/// Convert one JSON value to a cell of type `ty`.
pub fn json_to_value(json: &Json, ty: ColumnType) -> Result<Value> {
    if json.is_null() {
        return Ok(Value::Null);
    }

    let value = match ty {
        ColumnType::Integer => json.as_i64().map(Value::Integer),
        ColumnType::Float => json.as_f64().map(Value::Float),
        ColumnType::Text => json.as_str().map(Value::from),
        ColumnType::Boolean => json.as_bool().or_else(|| json.as_i64().and_then(int_to_bool)).map(Value::Boolean),
        ColumnType::DateTime => json.as_str().and_then(parse_datetime).map(Value::DateTime),
    };

    value.ok_or_else(|| Error::MalformedBatch(format!("cannot read {} as {}", json, ty)))
}

fn int_to_bool(i: i64) -> Option<bool> {
    match i {
        0 => Some(false),
        1 => Some(true),
        _ => None,
    }
}

/// Accepts RFC 3339 (converted to UTC) and naive `YYYY-MM-DD[ T]HH:MM:SS[.f]`.
fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

fn at_row(err: Error, index: usize, column: &str) -> Error {
    match err {
        Error::MalformedBatch(msg) => Error::MalformedBatch(format!("row {} column {:?}: {}", index, column, msg)),
        other => other,
    }
}
