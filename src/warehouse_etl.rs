//! Staged warehouse load: copy raw files into staging tables, then populate
//! the final tables with set-based SQL.
//!
//! With `--print-sql` the full Redshift script (DDL, COPY, transforms) is
//! written to stdout for execution through the warehouse's own client.
//! Without it the load runs locally against a SQLite database, staging from
//! the configured directories.

use anyhow::{Context, Result};
use clap::Parser;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use stardust_etl::cli::parse_path;
use stardust_etl::warehouse::queries::{Dialect, WarehouseQueries};
use stardust_etl::warehouse::WarehouseLoader;
use stardust_etl::WarehouseConfig;

#[derive(Parser, Debug)]
#[command(
    name = "warehouse-etl",
    about = "Stage raw files and materialize the star schema with set-based SQL"
)]
struct CliArgs {
    /// Path to the target SQLite database file (ignored with --print-sql).
    #[clap(value_parser = parse_path)]
    pub db: PathBuf,

    /// Path to the warehouse TOML config.
    #[clap(long, default_value = "dwh.toml", value_parser = parse_path)]
    pub config: PathBuf,

    /// Drop and recreate staging and final tables before loading.
    #[clap(long, default_value_t = false)]
    pub recreate_tables: bool,

    /// Print the Redshift SQL script instead of running locally.
    #[clap(long, default_value_t = false)]
    pub print_sql: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();
    let config = WarehouseConfig::load(&args.config)?;

    if args.print_sql {
        let queries = WarehouseQueries::new(Dialect::Redshift, &config);
        for sql in queries
            .drop_statements()
            .iter()
            .chain(queries.create_statements())
            .chain(queries.copy_statements())
            .chain(queries.insert_statements())
        {
            println!("{};\n", sql);
        }
        return Ok(());
    }

    let queries = WarehouseQueries::new(Dialect::Sqlite, &config);
    let loader = WarehouseLoader::new(queries);

    let mut conn = Connection::open(&args.db)
        .with_context(|| format!("Failed to open database: {:?}", args.db))?;
    if args.recreate_tables {
        loader.recreate_tables(&mut conn)?;
    }

    loader.stage_local(
        &mut conn,
        Path::new(&config.log_data_path),
        Path::new(&config.song_data_path),
    )?;
    loader.transform(&mut conn)?;

    info!("Warehouse load completed successfully");
    Ok(())
}
