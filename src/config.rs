use crate::provision::{ensure_table, Provisioned};
use crate::schema::{Column, ColumnSchema, PrimaryKeySpec};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// SQLite journal mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JournalMode {
    #[default]
    Wal,
    Delete,
    Memory,
}

impl JournalMode {
    pub fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
            Self::Memory => "memory",
        }
    }
}

/// SQLite `synchronous` setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    Off,
    #[default]
    Normal,
    Full,
}

impl SyncMode {
    pub fn pragma_value(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Normal => "normal",
            Self::Full => "full",
        }
    }
}

/// Runtime parameters applied when opening a store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    #[serde(default)]
    pub journal_mode: JournalMode,
    #[serde(default)]
    pub synchronous: SyncMode,
}

fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: JournalMode::default(),
            synchronous: SyncMode::default(),
        }
    }
}

/// A table declared in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    pub name: String,
    #[serde(default)]
    pub primary_key: Vec<String>,
    pub columns: Vec<Column>,
}

impl TableConfig {
    pub fn schema(&self) -> crate::Result<(ColumnSchema, PrimaryKeySpec)> {
        let schema = ColumnSchema::new(self.columns.clone())?;
        let key = PrimaryKeySpec::new(self.primary_key.iter().cloned());
        key.validate_against(&schema)?;
        Ok((schema, key))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TablemergeConfig {
    pub database: Option<String>,
    #[serde(flatten)]
    pub store: StoreConfig,
    #[serde(default)]
    pub tables: Vec<TableConfig>,
}

impl TablemergeConfig {
    pub fn table(&self, name: &str) -> Option<&TableConfig> {
        self.tables.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Provision `name` from its declaration, if it has one.
    ///
    /// Returns `None` for undeclared tables, which writes then create from the batch.
    pub fn ensure_declared(&self, conn: &Connection, name: &str) -> crate::Result<Option<Provisioned>> {
        let Some(table) = self.table(name) else {
            return Ok(None);
        };
        let (schema, key) = table.schema()?;
        ensure_table(conn, &table.name, &schema, &key).map(Some)
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("tablemerge.toml")
}

pub fn default_database_path() -> PathBuf {
    PathBuf::from("tablemerge.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<TablemergeConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: TablemergeConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &TablemergeConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// A starter config with one example table.
pub fn starter_config() -> TablemergeConfig {
    use crate::types::ColumnType;

    TablemergeConfig {
        database: Some(default_database_path().display().to_string()),
        store: StoreConfig::default(),
        tables: vec![TableConfig {
            name: "scores".to_string(),
            primary_key: vec!["id".to_string()],
            columns: vec![
                Column::new("id", ColumnType::Integer),
                Column::new("name", ColumnType::Text),
                Column::new("score", ColumnType::Float),
            ],
        }],
    }
}
