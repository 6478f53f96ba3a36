//! Record extraction from newline-delimited JSON files.
//!
//! Each input file is a sequence of independent JSON objects, one per line.
//! A malformed line is fatal for the whole file: the reader returns an error
//! and no partial record recovery is attempted.

use crate::model::{Gender, Level};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while extracting records from a file.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed record at {path}:{line}: {source}")]
    Json {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Read every record of a newline-delimited JSON file, in file order.
/// Blank lines are skipped; anything else must deserialize into `T`.
pub fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, ExtractError> {
    let file = File::open(path).map_err(|source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| ExtractError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|source| ExtractError::Json {
            path: path.to_path_buf(),
            line: index + 1,
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}

/// One line of a song-catalog file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SongRecord {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    pub year: i64,
    pub duration: f64,
    pub artist_name: String,
    #[serde(default)]
    pub artist_location: Option<String>,
    #[serde(default)]
    pub artist_latitude: Option<f64>,
    #[serde(default)]
    pub artist_longitude: Option<f64>,
}

/// Page value that marks a song-play event. All other pages are discarded by
/// the log transform.
pub const PLAY_ACTION: &str = "NextSong";

/// One line of an event-log file.
#[derive(Debug, Clone, Deserialize)]
pub struct EventRecord {
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub auth: Option<String>,
    #[serde(rename = "firstName", default)]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "de_gender")]
    pub gender: Option<Gender>,
    #[serde(rename = "itemInSession", default)]
    pub item_in_session: Option<i64>,
    #[serde(rename = "lastName", default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub length: Option<f64>,
    pub level: Level,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    pub page: String,
    #[serde(default)]
    pub registration: Option<f64>,
    #[serde(rename = "sessionId")]
    pub session_id: i64,
    #[serde(default)]
    pub song: Option<String>,
    #[serde(default)]
    pub status: Option<i64>,
    pub ts: i64,
    #[serde(rename = "userAgent", default)]
    pub user_agent: Option<String>,
    #[serde(rename = "userId", default, deserialize_with = "de_user_id")]
    pub user_id: Option<String>,
}

impl EventRecord {
    pub fn is_play(&self) -> bool {
        self.page == PLAY_ACTION
    }
}

/// The logs serialize userId as either a number or a string, and use the
/// empty string for logged-out sessions. Normalize all of that to
/// `Option<String>`.
fn de_user_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => {
            if s.is_empty() {
                Ok(None)
            } else {
                Ok(Some(s))
            }
        }
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "unexpected userId value: {}",
            other
        ))),
    }
}

fn de_gender<'de, D>(deserializer: D) -> Result<Option<Gender>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.as_deref().and_then(|s| {
        if s.is_empty() {
            None
        } else {
            Some(Gender::parse(s))
        }
    }))
}
