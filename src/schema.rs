//! Column schemas, primary keys and statement synthesis

use crate::types::ColumnType;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A named, typed column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self { name: name.into(), ty }
    }
}

/// Ordered column declarations. Order defines column order of the created table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    columns: Vec<Column>,
}

impl ColumnSchema {
    /// Build a schema, rejecting empty schemas and empty or duplicate names.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        if columns.is_empty() {
            return Err(Error::SchemaConflict("schema must declare at least one column".into()));
        }
        check_unique_names(columns.iter().map(|c| c.name.as_str()), "column")?;
        Ok(Self { columns })
    }

    /// Build a schema from `(name, type)` pairs.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, ColumnType)>,
        S: Into<String>,
    {
        Self::new(pairs.into_iter().map(|(name, ty)| Column::new(name, ty)).collect())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// SQLite identifiers are case-insensitive, so lookups are too.
    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name.eq_ignore_ascii_case(name))
    }
}

/// Ordered primary key column names. Empty means no declared key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrimaryKeySpec {
    columns: Vec<String>,
}

impl PrimaryKeySpec {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// A key spec that declares no primary key.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Every key column must be declared in `schema`, at most once.
    pub fn validate_against(&self, schema: &ColumnSchema) -> Result<()> {
        check_unique_names(self.columns.iter().map(String::as_str), "primary key column")?;
        if let Some(missing) = self.columns.iter().find(|k| !schema.contains(k)) {
            return Err(Error::SchemaConflict(format!(
                "primary key column {:?} is not declared in the schema",
                missing
            )));
        }
        Ok(())
    }
}

fn check_unique_names<'a>(names: impl Iterator<Item = &'a str>, what: &str) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if name.is_empty() {
            return Err(Error::SchemaConflict(format!("{} name must not be empty", what)));
        }
        if !seen.insert(name.to_ascii_lowercase()) {
            return Err(Error::SchemaConflict(format!("duplicate {} name {:?}", what, name)));
        }
    }
    Ok(())
}

/// Table names are quoted, so only emptiness and NUL bytes are unrepresentable.
pub fn validate_table_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains('\0') {
        return Err(Error::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Quote an SQL identifier, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Synthesize the `CREATE TABLE` statement for `schema` keyed by `key`.
pub fn create_table_sql(name: &str, schema: &ColumnSchema, key: &PrimaryKeySpec, if_not_exists: bool) -> String {
    let mut defs: Vec<String> = schema
        .columns()
        .iter()
        .map(|c| format!("{} {}", quote_ident(&c.name), c.ty.sql_type()))
        .collect();

    if !key.is_empty() {
        let key_cols: Vec<String> = key.columns().iter().map(|k| quote_ident(k)).collect();
        defs.push(format!(
            "CONSTRAINT {} PRIMARY KEY ({})",
            quote_ident(&format!("{}_pk", name)),
            key_cols.join(", ")
        ));
    }

    format!(
        "CREATE TABLE {}{} (\n    {}\n)",
        if if_not_exists { "IF NOT EXISTS " } else { "" },
        quote_ident(name),
        defs.join(",\n    ")
    )
}

/// Synthesize a parameterized insert over `columns`, optionally with replace semantics.
pub fn insert_sql<'a>(name: &str, columns: impl IntoIterator<Item = &'a str>, replace: bool) -> String {
    let cols: Vec<String> = columns.into_iter().map(quote_ident).collect();
    let params: Vec<String> = (1..=cols.len()).map(|i| format!("?{}", i)).collect();
    format!(
        "INSERT {}INTO {}({}) VALUES ({})",
        if replace { "OR REPLACE " } else { "" },
        quote_ident(name),
        cols.join(","),
        params.join(",")
    )
}
