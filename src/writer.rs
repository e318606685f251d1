//! Batch writes - insert-or-replace into existing tables, create-then-insert otherwise
//!
//! Existing tables are matched on the primary key recorded in the catalog.
//! Absent tables are created from the batch itself, keyed by the batch's
//! row-identifying key columns. Prefer [`crate::ensure_table`] before the first
//! write; the create path exists for callers that never provision.

use crate::batch::RowBatch;
use crate::catalog;
use crate::schema;
use crate::{Error, Result};
use rusqlite::{params_from_iter, Connection, Transaction, TransactionBehavior};

/// Which path a write took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePath {
    /// The table existed; rows were inserted or replaced by primary key.
    Upserted,
    /// The table was absent; it was created from the batch and rows were inserted.
    Created,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOutcome {
    pub path: WritePath,
    pub rows: usize,
}

/// Write `batch` into table `name`.
///
/// All rows are applied in one transaction: either every row is visible
/// afterwards or, on error, none are.
pub fn write_batch(conn: &Connection, name: &str, batch: &RowBatch) -> Result<WriteOutcome> {
    schema::validate_table_name(name)?;

    if catalog::table_exists(conn, name)? {
        upsert_rows(conn, name, batch)
    } else {
        create_and_insert(conn, name, batch)
    }
}

fn upsert_rows(conn: &Connection, name: &str, batch: &RowBatch) -> Result<WriteOutcome> {
    let key = catalog::primary_key_columns(conn, name)?;
    if key.is_empty() {
        tracing::warn!("Table {:?} has no primary key; insert-or-replace appends every row", name);
    }
    if let Some(missing) = key.iter().find(|k| !batch.has_column(k)) {
        return Err(Error::SchemaConflict(format!(
            "batch does not carry primary key column {:?} of table {:?}",
            missing, name
        )));
    }

    let sql = schema::insert_sql(name, batch.column_names(), true);
    tracing::debug!("Upserting {} rows into {:?}: {}", batch.len(), name, sql);

    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    insert_rows(&tx, &sql, batch)?;
    tx.commit()?;

    Ok(WriteOutcome {
        path: WritePath::Upserted,
        rows: batch.len(),
    })
}

/// Create `name` from the batch's shape and plain-insert every row.
///
/// The creation is unconditional: a table that appeared since the existence
/// check is a creation conflict, and nothing is inserted.
pub(crate) fn create_and_insert(conn: &Connection, name: &str, batch: &RowBatch) -> Result<WriteOutcome> {
    let create = schema::create_table_sql(name, &batch.schema()?, &batch.key_spec(), false);
    let insert = schema::insert_sql(name, batch.column_names(), false);

    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    tx.execute(&create, []).map_err(|e| creation_error(e, name, &create))?;
    tracing::info!(
        "Created table {:?} from batch keyed by [{}]",
        name,
        batch.key_spec().columns().join(", ")
    );

    insert_rows(&tx, &insert, batch)?;
    tx.commit()?;

    Ok(WriteOutcome {
        path: WritePath::Created,
        rows: batch.len(),
    })
}

fn insert_rows(tx: &Transaction<'_>, sql: &str, batch: &RowBatch) -> Result<()> {
    let mut stmt = tx.prepare_cached(sql).map_err(|e| Error::from_store(e, sql))?;
    for row in batch.rows() {
        stmt.execute(params_from_iter(row.iter()))
            .map_err(|e| Error::from_store(e, sql))?;
    }
    Ok(())
}

fn creation_error(err: rusqlite::Error, name: &str, sql: &str) -> Error {
    let exists = matches!(&err, rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("already exists"));
    if exists {
        return Error::SchemaConflict(format!("creation conflict: table {:?} already exists", name));
    }
    Error::from_store(err, sql)
}
