//! SQL statements for the staged warehouse pipeline.
//!
//! Every statement is rendered up front from the injected [`WarehouseConfig`]
//! so the loader only ever executes strings. Two dialects are supported:
//! `Redshift` for a real warehouse (bulk COPY from an object store) and
//! `Sqlite` for local runs and tests, where staging is filled from a local
//! directory instead of a COPY.
//!
//! Dialect differences worth knowing:
//! - `start_time` is a TIMESTAMP on Redshift and epoch milliseconds on sqlite.
//! - Redshift declares dimension primary keys but does not enforce them; the
//!   sqlite rendering leaves them undeclared so the set-based loads behave
//!   the same way. Re-running either pipeline without recreating tables
//!   therefore duplicates rows; there is no merge/upsert.
//! - Weekday is normalized to 0 = Monday on sqlite; the week number uses
//!   sqlite's `%W` (Monday-based), which is not the ISO week.

use crate::config::WarehouseConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Redshift,
    Sqlite,
}

/// The full statement set for one warehouse load, in execution order.
pub struct WarehouseQueries {
    dialect: Dialect,
    drop_statements: Vec<String>,
    create_statements: Vec<String>,
    copy_statements: Vec<String>,
    insert_statements: Vec<String>,
}

impl WarehouseQueries {
    pub fn new(dialect: Dialect, config: &WarehouseConfig) -> Self {
        let copy_statements = match dialect {
            Dialect::Redshift => vec![
                staging_events_copy(config),
                staging_songs_copy(config),
            ],
            // Local staging is loaded from files by the loader itself.
            Dialect::Sqlite => Vec::new(),
        };
        Self {
            dialect,
            drop_statements: DROP_TABLES.iter().map(|s| s.to_string()).collect(),
            create_statements: create_tables(dialect),
            copy_statements,
            // Ordering matters: songplays must exist before time is derived
            // from it, so the fact insert runs first and time runs last.
            insert_statements: vec![
                songplay_insert(dialect),
                USER_INSERT.to_string(),
                SONG_INSERT.to_string(),
                ARTIST_INSERT.to_string(),
                time_insert(dialect),
            ],
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn drop_statements(&self) -> &[String] {
        &self.drop_statements
    }

    pub fn create_statements(&self) -> &[String] {
        &self.create_statements
    }

    pub fn copy_statements(&self) -> &[String] {
        &self.copy_statements
    }

    pub fn insert_statements(&self) -> &[String] {
        &self.insert_statements
    }
}

const DROP_TABLES: &[&str] = &[
    "DROP TABLE IF EXISTS staging_events",
    "DROP TABLE IF EXISTS staging_songs",
    "DROP TABLE IF EXISTS songplays",
    "DROP TABLE IF EXISTS users",
    "DROP TABLE IF EXISTS songs",
    "DROP TABLE IF EXISTS artists",
    "DROP TABLE IF EXISTS time",
];

fn create_tables(dialect: Dialect) -> Vec<String> {
    let (songplay_id, start_time, dim_pk) = match dialect {
        Dialect::Redshift => (
            "songplay_id BIGINT IDENTITY(0,1) PRIMARY KEY",
            "TIMESTAMP",
            " PRIMARY KEY",
        ),
        Dialect::Sqlite => (
            "songplay_id INTEGER PRIMARY KEY AUTOINCREMENT",
            "BIGINT",
            "",
        ),
    };
    vec![
        // Staging tables are unconstrained load buffers.
        "CREATE TABLE IF NOT EXISTS staging_events (
    artist VARCHAR,
    auth VARCHAR,
    firstName VARCHAR,
    gender VARCHAR,
    itemInSession INTEGER,
    lastName VARCHAR,
    length FLOAT,
    level VARCHAR,
    location VARCHAR,
    method VARCHAR,
    page VARCHAR,
    registration FLOAT,
    sessionId INTEGER,
    song VARCHAR,
    status INTEGER,
    ts BIGINT,
    userAgent VARCHAR,
    userId VARCHAR)"
            .to_string(),
        "CREATE TABLE IF NOT EXISTS staging_songs (
    artist_id VARCHAR,
    artist_latitude FLOAT,
    artist_longitude FLOAT,
    artist_location VARCHAR,
    artist_name VARCHAR,
    song_id VARCHAR,
    title VARCHAR,
    duration FLOAT,
    year INTEGER)"
            .to_string(),
        format!(
            "CREATE TABLE IF NOT EXISTS songplays (
    {songplay_id},
    start_time {start_time},
    user_id VARCHAR NOT NULL,
    level VARCHAR,
    song_id VARCHAR,
    artist_id VARCHAR,
    session_id VARCHAR NOT NULL,
    location VARCHAR,
    user_agent VARCHAR)"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS users (
    user_id VARCHAR{dim_pk},
    first_name VARCHAR,
    last_name VARCHAR,
    gender VARCHAR,
    level VARCHAR NOT NULL)"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS songs (
    song_id VARCHAR{dim_pk},
    title VARCHAR NOT NULL,
    artist_id VARCHAR,
    year INTEGER,
    duration FLOAT)"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS artists (
    artist_id VARCHAR{dim_pk},
    name VARCHAR NOT NULL,
    location VARCHAR,
    latitude FLOAT,
    longitude FLOAT)"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS time (
    start_time {start_time}{dim_pk},
    hour INTEGER,
    day INTEGER,
    week INTEGER,
    month INTEGER,
    year INTEGER,
    weekday INTEGER)"
        ),
    ]
}

fn staging_events_copy(config: &WarehouseConfig) -> String {
    format!(
        "copy staging_events from '{}'
credentials 'aws_iam_role={}'
json '{}'
compupdate off
region '{}'",
        config.log_data_path, config.iam_role_arn, config.log_jsonpaths_path, config.region
    )
}

fn staging_songs_copy(config: &WarehouseConfig) -> String {
    format!(
        "copy staging_songs from '{}'
credentials 'aws_iam_role={}'
json 'auto'
compupdate off
region '{}'",
        config.song_data_path, config.iam_role_arn, config.region
    )
}

// The LEFT JOIN mirrors the procedural resolver: a play with no catalog
// match still lands in the fact table, with null song/artist keys.
fn songplay_insert(dialect: Dialect) -> String {
    let start_time = match dialect {
        Dialect::Redshift => "dateadd(millisecond, e.ts, '1970-01-01 00:00:00')",
        Dialect::Sqlite => "e.ts",
    };
    format!(
        "INSERT INTO songplays (start_time, user_id, level, song_id, artist_id, session_id, location, user_agent)
SELECT
    {start_time} AS start_time,
    e.userId AS user_id,
    e.level,
    s.song_id,
    s.artist_id,
    e.sessionId AS session_id,
    e.location,
    e.userAgent AS user_agent
FROM staging_events e
LEFT JOIN staging_songs s
    ON (e.song = s.title AND e.artist = s.artist_name AND e.length = s.duration)
WHERE e.page = 'NextSong'"
    )
}

const USER_INSERT: &str = "INSERT INTO users (user_id, first_name, last_name, gender, level)
SELECT DISTINCT
    userId AS user_id,
    firstName AS first_name,
    lastName AS last_name,
    gender,
    level
FROM staging_events
WHERE userId IS NOT NULL";

const SONG_INSERT: &str = "INSERT INTO songs (song_id, title, artist_id, year, duration)
SELECT DISTINCT
    song_id,
    title,
    artist_id,
    year,
    duration
FROM staging_songs";

const ARTIST_INSERT: &str = "INSERT INTO artists (artist_id, name, location, latitude, longitude)
SELECT DISTINCT
    artist_id,
    artist_name AS name,
    artist_location AS location,
    artist_latitude AS latitude,
    artist_longitude AS longitude
FROM staging_songs";

// Derived from the fact table, so it can never hold a timestamp with no
// play event behind it.
fn time_insert(dialect: Dialect) -> String {
    match dialect {
        Dialect::Redshift => "INSERT INTO time (start_time, hour, day, week, month, year, weekday)
SELECT DISTINCT
    start_time,
    EXTRACT(hour FROM start_time) AS hour,
    EXTRACT(day FROM start_time) AS day,
    EXTRACT(week FROM start_time) AS week,
    EXTRACT(month FROM start_time) AS month,
    EXTRACT(year FROM start_time) AS year,
    EXTRACT(dayofweek FROM start_time) AS weekday
FROM songplays"
            .to_string(),
        Dialect::Sqlite => "INSERT INTO time (start_time, hour, day, week, month, year, weekday)
SELECT DISTINCT
    start_time,
    CAST(strftime('%H', start_time / 1000, 'unixepoch') AS INTEGER) AS hour,
    CAST(strftime('%d', start_time / 1000, 'unixepoch') AS INTEGER) AS day,
    CAST(strftime('%W', start_time / 1000, 'unixepoch') AS INTEGER) AS week,
    CAST(strftime('%m', start_time / 1000, 'unixepoch') AS INTEGER) AS month,
    CAST(strftime('%Y', start_time / 1000, 'unixepoch') AS INTEGER) AS year,
    (CAST(strftime('%w', start_time / 1000, 'unixepoch') AS INTEGER) + 6) % 7 AS weekday
FROM songplays"
            .to_string(),
    }
}
