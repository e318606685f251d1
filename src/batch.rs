//! Row batches - one write call's worth of keyed rows
//!
//! A batch carries key (index) columns and value columns. Each row stores its
//! key values first, followed by its column values. Batches are validated on
//! construction and immutable afterwards.

use crate::schema::{Column, ColumnSchema, PrimaryKeySpec};
use crate::types::{ColumnType, Value};
use crate::{Error, Result};
use std::collections::HashSet;

/// Name of the key column synthesized for batches without an explicit key.
pub const IMPLICIT_INDEX: &str = "index";

/// A rectangular, typed set of rows with a row-identifying key.
#[derive(Debug, Clone, PartialEq)]
pub struct RowBatch {
    key: Vec<Column>,
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
}

impl RowBatch {
    pub fn builder() -> RowBatchBuilder {
        RowBatchBuilder::default()
    }

    /// Build a batch from columnar data.
    ///
    /// Every key and value column must hold the same number of rows.
    pub fn from_columns(key: Vec<(Column, Vec<Value>)>, columns: Vec<(Column, Vec<Value>)>) -> Result<Self> {
        let expected = key
            .iter()
            .chain(columns.iter())
            .map(|(_, values)| values.len())
            .next()
            .unwrap_or(0);

        for (column, values) in key.iter().chain(columns.iter()) {
            if values.len() != expected {
                return Err(Error::MalformedBatch(format!(
                    "row count mismatch: column {:?} has {} rows, expected {}",
                    column.name,
                    values.len(),
                    expected
                )));
            }
        }

        let (key_cols, key_data): (Vec<_>, Vec<_>) = key.into_iter().unzip();
        let (value_cols, value_data): (Vec<_>, Vec<_>) = columns.into_iter().unzip();

        let mut iters: Vec<_> = key_data
            .into_iter()
            .chain(value_data)
            .map(Vec::into_iter)
            .collect();
        let rows = (0..expected)
            .map(|_| iters.iter_mut().filter_map(|it| it.next()).collect())
            .collect();

        Self::assemble(key_cols, value_cols, rows)
    }

    fn assemble(mut key: Vec<Column>, columns: Vec<Column>, mut rows: Vec<Vec<Value>>) -> Result<Self> {
        if key.is_empty() {
            key.push(Column::new(IMPLICIT_INDEX, ColumnType::Integer));
            for (position, row) in rows.iter_mut().enumerate() {
                row.insert(0, Value::Integer(position as i64));
            }
        }

        let mut seen = HashSet::new();
        for column in key.iter().chain(columns.iter()) {
            if column.name.is_empty() {
                return Err(Error::MalformedBatch("column name must not be empty".into()));
            }
            if !seen.insert(column.name.to_ascii_lowercase()) {
                return Err(Error::MalformedBatch(format!("duplicate column {:?}", column.name)));
            }
        }

        let width = key.len() + columns.len();
        for (index, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(Error::MalformedBatch(format!(
                    "row {} has {} values, expected {}",
                    index,
                    row.len(),
                    width
                )));
            }
            // SQLite stores NULL keys as distinct rows, so they could never be replaced.
            if let Some((column, _)) = key.iter().zip(row.iter()).find(|(_, v)| v.is_null()) {
                return Err(Error::MalformedBatch(format!(
                    "row {} key column {:?} is null",
                    index, column.name
                )));
            }
            for (value, column) in row.iter().zip(key.iter().chain(columns.iter())) {
                if !value.conforms_to(column.ty) {
                    return Err(Error::MalformedBatch(format!(
                        "row {} column {:?}: {} value in {} column",
                        index,
                        column.name,
                        value.type_name(),
                        column.ty
                    )));
                }
            }
        }

        Ok(Self { key, columns, rows })
    }

    /// Row-identifying key columns.
    pub fn key_columns(&self) -> &[Column] {
        &self.key
    }

    /// All column names, key columns first.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.key.iter().chain(self.columns.iter()).map(|c| c.name.as_str())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_names().any(|c| c.eq_ignore_ascii_case(name))
    }

    /// Rows in key-then-values order.
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The schema a table created from this batch has: key columns, then value columns.
    pub fn schema(&self) -> Result<ColumnSchema> {
        ColumnSchema::new(self.key.iter().chain(self.columns.iter()).cloned().collect())
    }

    /// The batch key as a primary key spec.
    pub fn key_spec(&self) -> PrimaryKeySpec {
        PrimaryKeySpec::new(self.key.iter().map(|c| c.name.clone()))
    }
}

/// Row-wise batch construction. Validation happens in [`RowBatchBuilder::build`].
#[derive(Debug, Default)]
pub struct RowBatchBuilder {
    key: Vec<Column>,
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
}

impl RowBatchBuilder {
    pub fn key(mut self, name: impl Into<String>, ty: ColumnType) -> Self {
        self.key.push(Column::new(name, ty));
        self
    }

    pub fn column(mut self, name: impl Into<String>, ty: ColumnType) -> Self {
        self.columns.push(Column::new(name, ty));
        self
    }

    /// Append a row: key values first, then column values.
    pub fn row<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.rows.push(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn push_row(&mut self, values: Vec<Value>) {
        self.rows.push(values);
    }

    pub fn build(self) -> Result<RowBatch> {
        RowBatch::assemble(self.key, self.columns, self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_rows() {
        let batch = RowBatch::builder()
            .key("id", ColumnType::Integer)
            .column("name", ColumnType::Text)
            .column("score", ColumnType::Float)
            .row([Value::from(1), "a".into(), 0.5.into()])
            .row([Value::from(2), "b".into(), Value::Null])
            .build()
            .unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.column_names().collect::<Vec<_>>(), vec!["id", "name", "score"]);
        assert_eq!(batch.key_spec().columns(), ["id".to_string()]);
    }

    #[test]
    fn test_ragged_row_is_malformed() {
        let result = RowBatch::builder()
            .key("id", ColumnType::Integer)
            .column("name", ColumnType::Text)
            .row([Value::from(1)])
            .build();
        assert!(matches!(result, Err(Error::MalformedBatch(_))));
    }

    #[test]
    fn test_null_key_is_malformed() {
        let result = RowBatch::builder()
            .key("site", ColumnType::Text)
            .key("ts", ColumnType::Integer)
            .column("value", ColumnType::Integer)
            .row([Value::from("a"), Value::Null, Value::from(1)])
            .build();
        assert!(matches!(result, Err(Error::MalformedBatch(msg)) if msg.contains("\"ts\" is null")));
    }

    #[test]
    fn test_null_key_from_columns_is_malformed() {
        let result = RowBatch::from_columns(
            vec![(Column::new("id", ColumnType::Integer), vec![1.into(), Value::Null])],
            vec![(Column::new("name", ColumnType::Text), vec!["a".into(), "b".into()])],
        );
        assert!(matches!(result, Err(Error::MalformedBatch(msg)) if msg.contains("row 1")));
    }

    #[test]
    fn test_type_mismatch_is_malformed() {
        let result = RowBatch::builder()
            .key("id", ColumnType::Integer)
            .column("flag", ColumnType::Boolean)
            .row([Value::from(1), Value::from("yes")])
            .build();
        assert!(matches!(result, Err(Error::MalformedBatch(_))));
    }

    #[test]
    fn test_from_columns_transposes() {
        let batch = RowBatch::from_columns(
            vec![(Column::new("id", ColumnType::Integer), vec![1.into(), 2.into()])],
            vec![(Column::new("name", ColumnType::Text), vec!["a".into(), "b".into()])],
        )
        .unwrap();

        assert_eq!(batch.rows()[1], vec![Value::Integer(2), Value::from("b")]);
    }

    #[test]
    fn test_from_columns_length_mismatch() {
        let result = RowBatch::from_columns(
            vec![(Column::new("id", ColumnType::Integer), vec![1.into(), 2.into()])],
            vec![(Column::new("name", ColumnType::Text), vec!["a".into()])],
        );
        assert!(matches!(result, Err(Error::MalformedBatch(_))));
    }

    #[test]
    fn test_implicit_index() {
        let batch = RowBatch::builder()
            .column("name", ColumnType::Text)
            .row(["a"])
            .row(["b"])
            .build()
            .unwrap();

        assert_eq!(batch.key_columns()[0].name, IMPLICIT_INDEX);
        assert_eq!(batch.rows()[1], vec![Value::Integer(1), Value::from("b")]);
    }

    #[test]
    fn test_implicit_index_collision() {
        let result = RowBatch::builder()
            .column("index", ColumnType::Text)
            .row(["a"])
            .build();
        assert!(matches!(result, Err(Error::MalformedBatch(_))));
    }

    #[test]
    fn test_key_and_column_overlap() {
        let result = RowBatch::builder()
            .key("id", ColumnType::Integer)
            .column("id", ColumnType::Integer)
            .build();
        assert!(result.is_err());
    }
}
