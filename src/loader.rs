//! The transactional batch pipeline.
//!
//! Files are processed strictly one at a time; every row extracted from a
//! file is inserted inside a single transaction that commits only once the
//! whole file succeeded. Any extract or insert failure aborts the entire run:
//! already-committed files stay committed, the failing file leaves no rows
//! behind, later files are never attempted.

use crate::discovery::discover_files;
use crate::extract::{read_records, EventRecord, ExtractError, SongRecord};
use crate::model::{Artist, Song, TimeRecord, User};
use crate::resolve::SongIndex;
use crate::transform::{log_rows, song_rows, PlayCandidate, TransformError};
use indicatif::ProgressBar;
use rusqlite::{params, Connection, Transaction};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Extension of the input data files.
pub const DATA_EXTENSION: &str = "json";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("song catalog file has no records: {0}")]
    EmptySongFile(PathBuf),

    #[error("enrichment index error: {0}")]
    Index(anyhow::Error),
}

/// Row-by-row loader against a transactional store.
pub struct BatchLoader {
    conn: Connection,
}

impl BatchLoader {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn into_connection(self) -> Connection {
        self.conn
    }

    /// Run the whole pipeline: song catalog first, then event logs, so the
    /// enrichment index sees everything the catalog phase committed.
    pub fn run(&mut self, song_dir: &Path, log_dir: &Path) -> Result<(), LoadError> {
        self.process_song_data(song_dir)?;
        self.process_log_data(log_dir)?;
        Ok(())
    }

    pub fn process_song_data(&mut self, dir: &Path) -> Result<(), LoadError> {
        self.process_files(dir, process_song_file)
    }

    pub fn process_log_data(&mut self, dir: &Path) -> Result<(), LoadError> {
        let index = SongIndex::load(&self.conn).map_err(LoadError::Index)?;
        info!("enrichment index holds {} catalog entries", index.len());
        self.process_files(dir, |tx, path| process_log_file(tx, path, &index))
    }

    fn process_files<F>(&mut self, dir: &Path, mut handle: F) -> Result<(), LoadError>
    where
        F: FnMut(&Transaction, &Path) -> Result<(), LoadError>,
    {
        let files = discover_files(dir, DATA_EXTENSION);
        info!("{} files found in {}", files.len(), dir.display());

        let progress = ProgressBar::new(files.len() as u64);
        for (index, file) in files.iter().enumerate() {
            let tx = self.conn.transaction()?;
            handle(&tx, file)?;
            tx.commit()?;
            progress.inc(1);
            info!("{}/{} files processed", index + 1, files.len());
        }
        progress.finish_and_clear();
        Ok(())
    }
}

fn process_song_file(tx: &Transaction, path: &Path) -> Result<(), LoadError> {
    let records: Vec<SongRecord> = read_records(path)?;
    let (song, artist) =
        song_rows(&records).ok_or_else(|| LoadError::EmptySongFile(path.to_path_buf()))?;
    insert_song(tx, &song)?;
    insert_artist(tx, &artist)?;
    Ok(())
}

fn process_log_file(tx: &Transaction, path: &Path, index: &SongIndex) -> Result<(), LoadError> {
    let records: Vec<EventRecord> = read_records(path)?;
    let rows = log_rows(&records)?;
    for time in &rows.time {
        insert_time(tx, time)?;
    }
    for user in &rows.users {
        upsert_user(tx, user)?;
    }
    for play in &rows.plays {
        insert_play(tx, play, index)?;
    }
    Ok(())
}

// Dimension keys are immutable once inserted: duplicates are ignored, never
// overwritten.
fn insert_song(tx: &Transaction, song: &Song) -> Result<(), LoadError> {
    tx.execute(
        "INSERT OR IGNORE INTO songs (song_id, title, artist_id, year, duration)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            song.song_id,
            song.title,
            song.artist_id,
            song.year,
            song.duration
        ],
    )?;
    Ok(())
}

fn insert_artist(tx: &Transaction, artist: &Artist) -> Result<(), LoadError> {
    tx.execute(
        "INSERT OR IGNORE INTO artists (artist_id, name, location, latitude, longitude)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            artist.artist_id,
            artist.name,
            artist.location,
            artist.latitude,
            artist.longitude
        ],
    )?;
    Ok(())
}

fn insert_time(tx: &Transaction, time: &TimeRecord) -> Result<(), LoadError> {
    tx.execute(
        "INSERT OR IGNORE INTO time (start_time, hour, day, week, month, year, weekday)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            time.start_time,
            time.hour,
            time.day,
            time.week,
            time.month,
            time.year,
            time.weekday
        ],
    )?;
    Ok(())
}

// Users change plan over time; the last processed row wins.
fn upsert_user(tx: &Transaction, user: &User) -> Result<(), LoadError> {
    tx.execute(
        "INSERT INTO users (user_id, first_name, last_name, gender, level)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(user_id) DO UPDATE SET
             first_name = excluded.first_name,
             last_name = excluded.last_name,
             gender = excluded.gender,
             level = excluded.level",
        params![
            user.user_id,
            user.first_name,
            user.last_name,
            user.gender.map(|g| g.as_str()),
            user.level.as_str()
        ],
    )?;
    Ok(())
}

fn insert_play(tx: &Transaction, play: &PlayCandidate, index: &SongIndex) -> Result<(), LoadError> {
    let resolved = index.resolve(
        play.song_title.as_deref(),
        play.artist_name.as_deref(),
        play.duration,
    );
    let (song_id, artist_id) = match resolved {
        Some((song_id, artist_id)) => (Some(song_id), Some(artist_id)),
        None => (None, None),
    };
    tx.execute(
        "INSERT INTO songplays
             (start_time, user_id, level, song_id, artist_id, session_id, location, user_agent)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            play.start_time,
            play.user_id,
            play.level.as_str(),
            song_id,
            artist_id,
            play.session_id,
            play.location,
            play.user_agent
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::create_star_schema;
    use std::fs;

    fn loader() -> BatchLoader {
        let conn = Connection::open_in_memory().unwrap();
        create_star_schema(&conn).unwrap();
        BatchLoader::new(conn)
    }

    const SONG_LINE: &str = r#"{"num_songs": 1, "artist_id": "AR3HL1Q1187FB3DB2B", "artist_latitude": null, "artist_longitude": null, "artist_location": "Memphis, TN", "artist_name": "The Box Tops", "song_id": "SOSVXDR12AB0189D9D", "title": "Soul Deep", "duration": 148.03955, "year": 1969}"#;

    #[test]
    fn test_empty_directory_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut loader = loader();
        loader.process_song_data(dir.path()).unwrap();
        let count: i64 = loader
            .connection()
            .query_row("SELECT COUNT(*) FROM songs", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_duplicate_song_file_is_ignored_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.json"), SONG_LINE).unwrap();
        let changed = SONG_LINE.replace("1969", "1970");
        fs::write(dir.path().join("b.json"), changed).unwrap();

        let mut loader = loader();
        loader.process_song_data(dir.path()).unwrap();

        let (count, year): (i64, i64) = loader
            .connection()
            .query_row("SELECT COUNT(*), MAX(year) FROM songs", [], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })
            .unwrap();
        assert_eq!(count, 1);
        // a.json sorts first, so the 1969 row wins and b.json is ignored.
        assert_eq!(year, 1969);
    }

    #[test]
    fn test_empty_song_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("empty.json"), "\n").unwrap();
        let mut loader = loader();
        let result = loader.process_song_data(dir.path());
        assert!(matches!(result, Err(LoadError::EmptySongFile(_))));
    }

    #[test]
    fn test_play_without_user_id_aborts_with_constraint_error() {
        let dir = tempfile::tempdir().unwrap();
        let line = r#"{"artist":null,"auth":"Logged Out","firstName":null,"gender":null,"itemInSession":0,"lastName":null,"length":null,"level":"free","location":null,"method":"PUT","page":"NextSong","registration":null,"sessionId":52,"song":null,"status":200,"ts":1541121934796,"userAgent":null,"userId":""}"#;
        fs::write(dir.path().join("a.json"), line).unwrap();
        let mut loader = loader();
        let result = loader.process_log_data(dir.path());
        assert!(matches!(result, Err(LoadError::Db(_))));
        let count: i64 = loader
            .connection()
            .query_row("SELECT COUNT(*) FROM songplays", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
