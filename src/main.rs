use anyhow::{Context, Result};
use clap::Parser;
use rusqlite::Connection;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use stardust_etl::cli::parse_path;
use stardust_etl::loader::BatchLoader;
use stardust_etl::schema;

#[derive(Parser, Debug)]
#[command(
    name = "batch-etl",
    about = "Load a song catalog and event logs into the star schema, one file per transaction"
)]
struct CliArgs {
    /// Path to the target SQLite database file.
    #[clap(value_parser = parse_path)]
    pub db: PathBuf,

    /// Directory containing song-catalog JSON files.
    #[clap(long, value_parser = parse_path)]
    pub song_data: PathBuf,

    /// Directory containing event-log JSON files.
    #[clap(long, value_parser = parse_path)]
    pub log_data: PathBuf,

    /// Drop and recreate all tables before loading.
    #[clap(long, default_value_t = false)]
    pub recreate_tables: bool,
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
    if args.recreate_tables {
        schema::drop_star_schema(&conn)?;
    }
    schema::create_star_schema(&conn)?;

    let mut loader = BatchLoader::new(conn);
    loader.run(&args.song_data, &args.log_data)?;

    info!("Load completed successfully");
    Ok(())
}
