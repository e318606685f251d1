//! Tablemerge CLI - provision tables and merge JSON batches into SQLite

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tablemerge::config::{self, TablemergeConfig};
use tablemerge::ui::{self, Icons};
use tablemerge::{catalog, connection, ingest, Provisioned, WritePath};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "tablemerge")]
#[command(version)]
#[command(about = "Schema-driven table provisioning and insert-or-replace batch writes for SQLite")]
#[command(long_about = r#"
Tablemerge keeps long-lived SQLite tables up to date with periodically collected rows:
  • Tables are created once from the column declarations in tablemerge.toml
  • Later batches replace rows whose primary key they share
  • Rows absent from a batch are left untouched

Example usage:
  tablemerge init
  tablemerge provision
  tablemerge write --table scores --input batch.json
  tablemerge describe --table scores
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the database file (overrides the config)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter config file
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Create every table declared in the config that does not exist yet
    Provision,

    /// Merge a JSON batch file into a table
    Write {
        /// Target table
        #[arg(short, long)]
        table: String,

        /// JSON batch file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Show the columns and primary key of a table
    Describe {
        /// Table to describe
        #[arg(short, long)]
        table: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if let Err(err) = run(cli) {
        ui::error(&format!("{:#}", err));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);

    if let Commands::Init { force } = cli.command {
        config::write_config(&config_path, &config::starter_config(), force)?;
        ui::success(&format!("Wrote {}", config_path.display()));
        return Ok(());
    }

    let cfg = config::load_config(Some(&config_path))
        .with_context(|| format!("failed to load {}", config_path.display()))?
        .unwrap_or_default();
    let database = database_path(cli.database.as_deref(), &cfg);
    config::ensure_db_dir(&database)?;
    let conn = connection::open_store(&database, &cfg.store)
        .with_context(|| format!("failed to open {}", database.display()))?;

    match cli.command {
        Commands::Init { .. } => {}

        Commands::Provision => {
            if cfg.tables.is_empty() {
                ui::warn(&format!("No tables declared in {}", config_path.display()));
                return Ok(());
            }

            ui::header(&format!("Provisioning {} tables", cfg.tables.len()));
            ui::info("Database", &database.display().to_string());
            for table in &cfg.tables {
                let (schema, key) = table.schema().with_context(|| format!("table {:?}", table.name))?;
                match tablemerge::ensure_table(&conn, &table.name, &schema, &key)? {
                    Provisioned::Created => println!("{} {} created", Icons::NEW, table.name),
                    Provisioned::AlreadyExists => println!("{} {} already exists", Icons::TABLE, table.name),
                }
            }
            ui::success("Provisioning complete");
        }

        Commands::Write { table, input } => {
            let batch = ingest::load_batch(&input).with_context(|| format!("failed to read {}", input.display()))?;
            tracing::info!("Writing {} rows from {} into {:?}", batch.len(), input.display(), table);

            if cfg.ensure_declared(&conn, &table)? == Some(Provisioned::Created) {
                println!("{} {} created from its declaration", Icons::NEW, table);
            }
            let outcome = tablemerge::write_batch(&conn, &table, &batch)?;
            match outcome.path {
                WritePath::Upserted => println!("{} Merged {} rows into {}", Icons::MERGE, outcome.rows, table),
                WritePath::Created => {
                    ui::warn(&format!("Table {} did not exist; created it from the batch", table));
                    println!("{} Inserted {} rows into {}", Icons::NEW, outcome.rows, table);
                }
            }
            ui::summary_row("Total rows:", &catalog::row_count(&conn, &table)?.to_string());
        }

        Commands::Describe { table } => {
            if !catalog::table_exists(&conn, &table)? {
                anyhow::bail!("table {:?} does not exist in {}", table, database.display());
            }

            let columns = catalog::table_columns(&conn, &table)?;
            ui::section(&format!(" {} {} ", Icons::DATABASE, table));
            println!("{}", ui::columns_table(&columns));

            let key = catalog::primary_key_columns(&conn, &table)?;
            if key.is_empty() {
                ui::warn("No primary key: writes append instead of replacing");
            } else {
                ui::summary_row(&format!("{} Primary key:", Icons::KEY), &key.join(", "));
            }
            ui::summary_row("Rows:", &catalog::row_count(&conn, &table)?.to_string());
        }
    }

    Ok(())
}

fn database_path(flag: Option<&Path>, cfg: &TablemergeConfig) -> PathBuf {
    flag.map(Path::to_path_buf)
        .or_else(|| cfg.database.as_ref().map(PathBuf::from))
        .unwrap_or_else(config::default_database_path)
}
