//! Schema provisioning - create a keyed table once, leave it alone afterwards

use crate::catalog;
use crate::schema::{self, ColumnSchema, PrimaryKeySpec};
use crate::{Error, Result};
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// What [`ensure_table`] found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioned {
    Created,
    AlreadyExists,
}

/// Ensure table `name` exists with the given columns and primary key.
///
/// If a table with that name already exists nothing is issued against it: the
/// existing shape is kept even when it differs from `schema`. The catalog check
/// and the creation run under one write-locked transaction, so concurrent
/// callers on the same store create the table at most once.
pub fn ensure_table(
    conn: &Connection,
    name: &str,
    schema: &ColumnSchema,
    primary_key: &PrimaryKeySpec,
) -> Result<Provisioned> {
    schema::validate_table_name(name)?;
    primary_key.validate_against(schema)?;

    let sql = schema::create_table_sql(name, schema, primary_key, true);

    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    if catalog::table_exists(&tx, name)? {
        tracing::debug!("Table {:?} already exists, leaving it unchanged", name);
        return Ok(Provisioned::AlreadyExists);
    }

    tracing::debug!("Provisioning table {:?}: {}", name, sql);
    tx.execute(&sql, []).map_err(|e| Error::from_store(e, &sql))?;
    tx.commit()?;

    tracing::info!(
        "Created table {:?} with {} columns, primary key [{}]",
        name,
        schema.len(),
        primary_key.columns().join(", ")
    );
    Ok(Provisioned::Created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::open_in_memory;
    use crate::types::ColumnType;

    fn scores_schema() -> ColumnSchema {
        ColumnSchema::from_pairs([
            ("id", ColumnType::Integer),
            ("name", ColumnType::Text),
            ("score", ColumnType::Float),
        ])
        .unwrap()
    }

    #[test]
    fn test_creates_empty_table() {
        let conn = open_in_memory().unwrap();
        let outcome = ensure_table(&conn, "scores", &scores_schema(), &PrimaryKeySpec::new(["id"])).unwrap();

        assert_eq!(outcome, Provisioned::Created);
        assert_eq!(catalog::row_count(&conn, "scores").unwrap(), 0);
        assert_eq!(catalog::primary_key_columns(&conn, "scores").unwrap(), vec!["id"]);

        let types: Vec<String> = catalog::table_columns(&conn, "scores")
            .unwrap()
            .into_iter()
            .map(|c| c.declared_type)
            .collect();
        assert_eq!(types, vec!["INTEGER", "TEXT", "REAL"]);
    }

    #[test]
    fn test_idempotent() {
        let conn = open_in_memory().unwrap();
        let key = PrimaryKeySpec::new(["id"]);
        ensure_table(&conn, "scores", &scores_schema(), &key).unwrap();
        let before = catalog::table_columns(&conn, "scores").unwrap();

        let outcome = ensure_table(&conn, "scores", &scores_schema(), &key).unwrap();
        assert_eq!(outcome, Provisioned::AlreadyExists);
        assert_eq!(catalog::table_columns(&conn, "scores").unwrap(), before);
    }

    #[test]
    fn test_different_schema_leaves_table_unchanged() {
        let conn = open_in_memory().unwrap();
        ensure_table(&conn, "scores", &scores_schema(), &PrimaryKeySpec::new(["id"])).unwrap();
        let before = catalog::table_columns(&conn, "scores").unwrap();

        let other = ColumnSchema::from_pairs([("label", ColumnType::Text), ("when", ColumnType::DateTime)]).unwrap();
        let outcome = ensure_table(&conn, "scores", &other, &PrimaryKeySpec::new(["label"])).unwrap();

        assert_eq!(outcome, Provisioned::AlreadyExists);
        assert_eq!(catalog::table_columns(&conn, "scores").unwrap(), before);
    }

    #[test]
    fn test_no_primary_key() {
        let conn = open_in_memory().unwrap();
        ensure_table(&conn, "log", &scores_schema(), &PrimaryKeySpec::none()).unwrap();
        assert!(catalog::primary_key_columns(&conn, "log").unwrap().is_empty());
    }

    #[test]
    fn test_composite_key() {
        let conn = open_in_memory().unwrap();
        ensure_table(&conn, "scores", &scores_schema(), &PrimaryKeySpec::new(["name", "id"])).unwrap();
        assert_eq!(catalog::primary_key_columns(&conn, "scores").unwrap(), vec!["name", "id"]);
    }

    #[test]
    fn test_key_outside_schema_is_rejected() {
        let conn = open_in_memory().unwrap();
        let result = ensure_table(&conn, "scores", &scores_schema(), &PrimaryKeySpec::new(["missing"]));
        assert!(matches!(result, Err(Error::SchemaConflict(_))));
        assert!(!catalog::table_exists(&conn, "scores").unwrap());
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let conn = open_in_memory().unwrap();
        let result = ensure_table(&conn, "", &scores_schema(), &PrimaryKeySpec::none());
        assert!(matches!(result, Err(Error::InvalidName(_))));
    }

    #[test]
    fn test_open_transaction_is_rejected() {
        let conn = open_in_memory().unwrap();
        conn.execute_batch("BEGIN").unwrap();
        let result = ensure_table(&conn, "scores", &scores_schema(), &PrimaryKeySpec::new(["id"]));
        assert!(matches!(result, Err(Error::StatementRejected { .. })));
    }
}
