//! Catalog lookups against `sqlite_master` and `pragma_table_info`

use crate::schema::quote_ident;
use crate::{Error, Result};
use rusqlite::{Connection, OptionalExtension};

/// One column of an existing table, as recorded by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub declared_type: String,
    pub not_null: bool,
    /// 1-based position within the primary key, if the column is part of it.
    pub pk_position: Option<usize>,
}

const TABLE_EXISTS_SQL: &str = "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE";

const TABLE_INFO_SQL: &str =
    "SELECT name, type, \"notnull\", pk FROM pragma_table_info(?1) ORDER BY cid";

/// Check whether a table with this name exists. Names match case-insensitively, like SQLite identifiers.
pub fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(TABLE_EXISTS_SQL, [name], |row| row.get(0))
        .optional()
        .map_err(|e| Error::from_store(e, TABLE_EXISTS_SQL))?;
    Ok(found.is_some())
}

/// Columns of `name` in declaration order. Empty if the table does not exist.
pub fn table_columns(conn: &Connection, name: &str) -> Result<Vec<ColumnInfo>> {
    let mut stmt = conn
        .prepare_cached(TABLE_INFO_SQL)
        .map_err(|e| Error::from_store(e, TABLE_INFO_SQL))?;

    let columns = stmt
        .query_map([name], |row| {
            let pk: i64 = row.get(3)?;
            Ok(ColumnInfo {
                name: row.get(0)?,
                declared_type: row.get(1)?,
                not_null: row.get(2)?,
                pk_position: (pk > 0).then_some(pk as usize),
            })
        })
        .map_err(|e| Error::from_store(e, TABLE_INFO_SQL))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| Error::from_store(e, TABLE_INFO_SQL))?;

    Ok(columns)
}

/// Primary key columns of `name`, in key order.
pub fn primary_key_columns(conn: &Connection, name: &str) -> Result<Vec<String>> {
    let mut keyed: Vec<(usize, String)> = table_columns(conn, name)?
        .into_iter()
        .filter_map(|c| c.pk_position.map(|pos| (pos, c.name)))
        .collect();
    keyed.sort_by_key(|(pos, _)| *pos);
    Ok(keyed.into_iter().map(|(_, name)| name).collect())
}

/// Count rows in `name`.
pub fn row_count(conn: &Connection, name: &str) -> Result<usize> {
    let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(name));
    let count: i64 = conn
        .query_row(&sql, [], |row| row.get(0))
        .map_err(|e| Error::from_store(e, &sql))?;
    Ok(count as usize)
}
