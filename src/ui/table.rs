use crate::catalog::ColumnInfo;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct ColumnRow {
    #[tabled(rename = "Column")]
    name: String,
    #[tabled(rename = "Type")]
    declared_type: String,
    #[tabled(rename = "Not Null")]
    not_null: String,
    #[tabled(rename = "Key")]
    key: String,
}

/// Render catalog columns as a table, marking primary key positions.
pub fn columns_table(columns: &[ColumnInfo]) -> String {
    if columns.is_empty() {
        return String::new();
    }

    let rows: Vec<ColumnRow> = columns
        .iter()
        .map(|c| ColumnRow {
            name: c.name.clone(),
            declared_type: c.declared_type.clone(),
            not_null: if c.not_null { "yes".into() } else { String::new() },
            key: c.pk_position.map(|p| format!("PK {}", p)).unwrap_or_default(),
        })
        .collect();

    Table::new(&rows).with(Style::rounded()).to_string()
}
