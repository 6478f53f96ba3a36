//! Star-schema DDL for the transactional (row-by-row) pipeline.
//!
//! `start_time` columns hold epoch milliseconds. Dropping and recreating the
//! tables is the job of the `create-tables` binary (or the `--recreate-tables`
//! flags); the loaders assume the schema is already in place.

use anyhow::Result;
use rusqlite::Connection;

pub const STAR_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS songs (
    song_id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    artist_id TEXT,
    year INTEGER,
    duration REAL
);

CREATE TABLE IF NOT EXISTS artists (
    artist_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    location TEXT,
    latitude REAL,
    longitude REAL
);

CREATE TABLE IF NOT EXISTS users (
    user_id TEXT PRIMARY KEY,
    first_name TEXT,
    last_name TEXT,
    gender TEXT,
    level TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS time (
    start_time INTEGER PRIMARY KEY,
    hour INTEGER,
    day INTEGER,
    week INTEGER,
    month INTEGER,
    year INTEGER,
    weekday INTEGER
);

CREATE TABLE IF NOT EXISTS songplays (
    songplay_id INTEGER PRIMARY KEY AUTOINCREMENT,
    start_time INTEGER,
    user_id TEXT NOT NULL,
    level TEXT,
    song_id TEXT,
    artist_id TEXT,
    session_id INTEGER NOT NULL,
    location TEXT,
    user_agent TEXT
);
"#;

const DROP_SQL: &str = r#"
DROP TABLE IF EXISTS songplays;
DROP TABLE IF EXISTS time;
DROP TABLE IF EXISTS users;
DROP TABLE IF EXISTS artists;
DROP TABLE IF EXISTS songs;
"#;

pub fn create_star_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(STAR_SCHEMA_SQL)?;
    Ok(())
}

pub fn drop_star_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(DROP_SQL)?;
    Ok(())
}
