//! Shared helpers for the command-line binaries.

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Resolve a CLI path argument to an absolute path. A path that does not
/// exist yet (a database file about to be created) is kept as given and made
/// absolute against the current directory.
pub fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}
