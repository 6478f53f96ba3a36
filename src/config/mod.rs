//! Warehouse configuration, loaded from a TOML file and passed explicitly to
//! the staged loader. Nothing reads this from ambient state.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct WarehouseConfig {
    /// Object-store prefix (or local directory) holding event-log files.
    pub log_data_path: String,
    /// Object-store prefix (or local directory) holding song-catalog files.
    pub song_data_path: String,
    /// JSONPaths file describing the fixed column layout of event logs.
    pub log_jsonpaths_path: String,
    /// IAM role the warehouse assumes for the bulk copy.
    pub iam_role_arn: String,
    #[serde(default = "default_region")]
    pub region: String,
}

fn default_region() -> String {
    "us-west-2".to_string()
}

impl WarehouseConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
