//! Pure transforms from raw records into star-schema rows.
//!
//! Nothing in this module touches the filesystem or the database; both
//! pipelines' semantics for filtering, deduplication and calendar derivation
//! live here so they can be tested in isolation.

use crate::extract::{EventRecord, SongRecord};
use crate::model::{Artist, Level, Song, TimeRecord, User};
use chrono::{DateTime, Datelike, Timelike, Utc};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("timestamp out of range: {0} ms")]
    TimestampOutOfRange(i64),
}

/// Project a song-catalog file's records into one Song and one Artist row.
///
/// A catalog file carries a single song; duplicate rows within a file
/// collapse to the first one. Returns `None` for a file with no records.
pub fn song_rows(records: &[SongRecord]) -> Option<(Song, Artist)> {
    let record = records.first()?;
    let song = Song {
        song_id: record.song_id.clone(),
        title: record.title.clone(),
        artist_id: record.artist_id.clone(),
        year: record.year,
        duration: record.duration,
    };
    let artist = Artist {
        artist_id: record.artist_id.clone(),
        name: record.artist_name.clone(),
        location: none_if_empty(record.artist_location.clone()),
        latitude: record.artist_latitude,
        longitude: record.artist_longitude,
    };
    Some((song, artist))
}

// The catalog dumps use "" for a missing artist location.
fn none_if_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Derive the calendar fields of the `time` dimension from an epoch-ms
/// timestamp. Pure and deterministic: week is the ISO week number, weekday is
/// 0 = Monday through 6 = Sunday.
pub fn calendar_fields(ts_ms: i64) -> Result<TimeRecord, TransformError> {
    let dt: DateTime<Utc> = DateTime::from_timestamp_millis(ts_ms)
        .ok_or(TransformError::TimestampOutOfRange(ts_ms))?;
    Ok(TimeRecord {
        start_time: ts_ms,
        hour: dt.hour(),
        day: dt.day(),
        week: dt.iso_week().week(),
        month: dt.month(),
        year: dt.year(),
        weekday: dt.weekday().num_days_from_monday(),
    })
}

/// A play event before enrichment: song/artist references are still the raw
/// lookup hints, not resolved keys.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayCandidate {
    pub start_time: i64,
    pub user_id: Option<String>,
    pub level: Level,
    pub session_id: i64,
    pub location: Option<String>,
    pub user_agent: Option<String>,
    pub song_title: Option<String>,
    pub artist_name: Option<String>,
    pub duration: Option<f64>,
}

/// Output of the log transform for one file.
#[derive(Debug, Default)]
pub struct LogRows {
    pub time: Vec<TimeRecord>,
    pub users: Vec<User>,
    pub plays: Vec<PlayCandidate>,
}

/// Transform one event-log file's records.
///
/// Only song-play records are retained. Time rows are emitted once per
/// distinct timestamp (first occurrence); user rows are deduplicated by exact
/// full-row equality only, so the same user appearing with two different
/// levels yields two rows (the loader's upsert makes the last one win).
pub fn log_rows(records: &[EventRecord]) -> Result<LogRows, TransformError> {
    let plays: Vec<&EventRecord> = records.iter().filter(|r| r.is_play()).collect();

    let mut time = Vec::new();
    let mut seen_ts = HashSet::new();
    for record in &plays {
        if seen_ts.insert(record.ts) {
            time.push(calendar_fields(record.ts)?);
        }
    }

    let mut users: Vec<User> = Vec::new();
    for record in &plays {
        let Some(user_id) = &record.user_id else {
            continue;
        };
        let user = User {
            user_id: user_id.clone(),
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            gender: record.gender,
            level: record.level,
        };
        if !users.contains(&user) {
            users.push(user);
        }
    }

    let play_rows = plays
        .iter()
        .map(|record| PlayCandidate {
            start_time: record.ts,
            user_id: record.user_id.clone(),
            level: record.level,
            session_id: record.session_id,
            location: record.location.clone(),
            user_agent: record.user_agent.clone(),
            song_title: record.song.clone(),
            artist_name: record.artist.clone(),
            duration: record.length,
        })
        .collect();

    Ok(LogRows {
        time,
        users,
        plays: play_rows,
    })
}
