//! stardust-etl
//!
//! Two pipelines load play-event logs and a song catalog into a dimensional
//! star schema (`songs`, `artists`, `users`, `time`, `songplays`):
//!
//! - [`loader::BatchLoader`] walks local JSON files and inserts row by row,
//!   committing once per file.
//! - [`warehouse::WarehouseLoader`] bulk-copies raw files into staging tables
//!   and materializes the final tables with set-based SQL.

pub mod cli;
pub mod config;
pub mod discovery;
pub mod extract;
pub mod loader;
pub mod model;
pub mod resolve;
pub mod schema;
pub mod transform;
pub mod warehouse;

pub use config::WarehouseConfig;
pub use loader::{BatchLoader, LoadError};
pub use resolve::SongIndex;
pub use warehouse::queries::{Dialect, WarehouseQueries};
pub use warehouse::{SqlExecutor, WarehouseLoader};
