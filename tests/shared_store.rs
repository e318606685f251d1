//! Two connections sharing one database file.

use tablemerge::config::StoreConfig;
use tablemerge::connection::open_store;
use tablemerge::{catalog, ensure_table, write_batch, ColumnSchema, ColumnType, PrimaryKeySpec, Provisioned, RowBatch, Value};

fn counter_schema() -> (ColumnSchema, PrimaryKeySpec) {
    let schema = ColumnSchema::from_pairs([("name", ColumnType::Text), ("hits", ColumnType::Integer)]).unwrap();
    (schema, PrimaryKeySpec::new(["name"]))
}

fn counters(rows: &[(&str, i64)]) -> RowBatch {
    let mut builder = RowBatch::builder()
        .key("name", ColumnType::Text)
        .column("hits", ColumnType::Integer);
    for (name, hits) in rows {
        builder.push_row(vec![Value::from(*name), Value::from(*hits)]);
    }
    builder.build().unwrap()
}

#[test]
fn second_connection_sees_provisioned_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.db");
    let first = open_store(&path, &StoreConfig::default()).unwrap();
    let second = open_store(&path, &StoreConfig::default()).unwrap();
    let (schema, key) = counter_schema();

    assert_eq!(ensure_table(&first, "counters", &schema, &key).unwrap(), Provisioned::Created);
    assert_eq!(ensure_table(&second, "counters", &schema, &key).unwrap(), Provisioned::AlreadyExists);
}

#[test]
fn writes_from_both_connections_merge() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.db");
    let first = open_store(&path, &StoreConfig::default()).unwrap();
    let second = open_store(&path, &StoreConfig::default()).unwrap();
    let (schema, key) = counter_schema();
    ensure_table(&first, "counters", &schema, &key).unwrap();

    write_batch(&first, "counters", &counters(&[("a", 1), ("b", 1)])).unwrap();
    write_batch(&second, "counters", &counters(&[("b", 5), ("c", 1)])).unwrap();

    let hits: i64 = first
        .query_row("SELECT hits FROM counters WHERE name = 'b'", [], |row| row.get(0))
        .unwrap();
    assert_eq!(hits, 5);
    assert_eq!(catalog::row_count(&first, "counters").unwrap(), 3);
}

#[test]
fn table_created_from_batch_is_upserted_by_other_connection() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.db");
    let first = open_store(&path, &StoreConfig::default()).unwrap();
    let second = open_store(&path, &StoreConfig::default()).unwrap();

    write_batch(&first, "counters", &counters(&[("a", 1)])).unwrap();

    let outcome = write_batch(&second, "counters", &counters(&[("a", 2)])).unwrap();
    assert_eq!(outcome.path, tablemerge::WritePath::Upserted);
    assert_eq!(catalog::row_count(&second, "counters").unwrap(), 1);
}

#[test]
fn locked_store_reports_retryable_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.db");
    let cfg = StoreConfig {
        busy_timeout_ms: 0,
        ..StoreConfig::default()
    };
    let holder = open_store(&path, &cfg).unwrap();
    let writer = open_store(&path, &cfg).unwrap();
    let (schema, key) = counter_schema();
    ensure_table(&holder, "counters", &schema, &key).unwrap();

    holder.execute_batch("BEGIN IMMEDIATE").unwrap();
    let err = write_batch(&writer, "counters", &counters(&[("a", 1)])).unwrap_err();
    assert!(err.is_retryable(), "unexpected error: {err:?}");

    holder.execute_batch("ROLLBACK").unwrap();
    write_batch(&writer, "counters", &counters(&[("a", 1)])).unwrap();
}
