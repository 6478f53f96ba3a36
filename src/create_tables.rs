//! Drops and recreates the star schema on the target database. Run once
//! before either pipeline.

use anyhow::{Context, Result};
use clap::Parser;
use rusqlite::Connection;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use stardust_etl::cli::parse_path;
use stardust_etl::schema;

#[derive(Parser, Debug)]
#[command(name = "create-tables", about = "Drop and recreate the star schema")]
struct CliArgs {
    /// Path to the target SQLite database file.
    #[clap(value_parser = parse_path)]
    pub db: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();
    let conn = Connection::open(&args.db)
        .with_context(|| format!("Failed to open database: {:?}", args.db))?;

    schema::drop_star_schema(&conn)?;
    schema::create_star_schema(&conn)?;

    info!("Tables created");
    Ok(())
}
