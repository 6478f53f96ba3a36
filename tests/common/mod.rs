//! Shared fixtures for the end-to-end pipeline tests.
#![allow(dead_code)]

use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};

/// A real song-catalog line (one song, one artist).
pub const SOUL_DEEP_SONG: &str = r#"{"num_songs": 1, "artist_id": "AR3HL1Q1187FB3DB2B", "artist_latitude": null, "artist_longitude": null, "artist_location": "Memphis, TN", "artist_name": "The Box Tops", "song_id": "SOSVXDR12AB0189D9D", "title": "Soul Deep", "duration": 148.03955, "year": 1969}"#;

/// Build one event-log line with the given page.
pub fn event_line(
    page: &str,
    ts: i64,
    user_id: &str,
    level: &str,
    song: &str,
    artist: &str,
    length: f64,
) -> String {
    format!(
        concat!(
            r#"{{"artist":"{artist}","auth":"Logged In","firstName":"Kaylee","gender":"F","#,
            r#""itemInSession":0,"lastName":"Summers","length":{length},"level":"{level}","#,
            r#""location":"Phoenix-Mesa-Scottsdale, AZ","method":"PUT","page":"{page}","#,
            r#""registration":1540344794796.0,"sessionId":139,"song":"{song}","status":200,"#,
            r#""ts":{ts},"userAgent":"Mozilla/5.0","userId":"{user_id}"}}"#
        ),
        artist = artist,
        length = length,
        level = level,
        page = page,
        song = song,
        ts = ts,
        user_id = user_id,
    )
}

pub fn play_line(ts: i64, user_id: &str, level: &str, song: &str, artist: &str, length: f64) -> String {
    event_line("NextSong", ts, user_id, level, song, artist, length)
}

pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

pub fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
        .unwrap()
}
