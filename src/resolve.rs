//! Enrichment of play events with song/artist keys.
//!
//! Play events reference the catalog only by (song title, artist name,
//! duration). The index below materializes the songs⨝artists join once and
//! answers those lookups in memory; a miss is a normal outcome and yields
//! null foreign keys downstream.

use anyhow::Result;
use rusqlite::Connection;
use std::collections::HashMap;

/// Natural key of a catalog entry. Duration is matched exactly, so the key
/// stores the raw bits of the float.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct NaturalKey {
    title: String,
    artist: String,
    duration_bits: u64,
}

impl NaturalKey {
    fn new(title: &str, artist: &str, duration: f64) -> Self {
        // SQL's numeric `=` treats -0.0 and 0.0 as equal; fold them to one
        // bit pattern so the index agrees with the join.
        let duration = if duration == 0.0 { 0.0 } else { duration };
        Self {
            title: title.to_string(),
            artist: artist.to_string(),
            duration_bits: duration.to_bits(),
        }
    }
}

/// In-memory lookup from (title, artist name, duration) to
/// (song_id, artist_id).
pub struct SongIndex {
    entries: HashMap<NaturalKey, (String, String)>,
}

impl SongIndex {
    /// Build the index from the persisted catalog. When several catalog rows
    /// share a natural key, the first one in storage order wins; later
    /// duplicates are ignored.
    pub fn load(conn: &Connection) -> Result<Self> {
        let mut stmt = conn.prepare(
            "SELECT s.title, a.name, s.duration, s.song_id, a.artist_id
             FROM songs s
             JOIN artists a ON s.artist_id = a.artist_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut entries = HashMap::new();
        for row in rows {
            let (title, artist, duration, song_id, artist_id) = row?;
            entries
                .entry(NaturalKey::new(&title, &artist, duration))
                .or_insert((song_id, artist_id));
        }
        Ok(Self { entries })
    }

    /// Exact match on all three hints. Any missing hint, or no catalog entry,
    /// resolves to `None`.
    pub fn resolve(
        &self,
        title: Option<&str>,
        artist: Option<&str>,
        duration: Option<f64>,
    ) -> Option<(&str, &str)> {
        let (title, artist, duration) = (title?, artist?, duration?);
        self.entries
            .get(&NaturalKey::new(title, artist, duration))
            .map(|(song_id, artist_id)| (song_id.as_str(), artist_id.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::create_star_schema;
    use rusqlite::{params, OptionalExtension};

    fn catalog_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_star_schema(&conn).unwrap();
        insert_pair(
            &conn,
            "SOSVXDR12AB0189D9D",
            "Soul Deep",
            148.03955,
            "AR3HL1Q1187FB3DB2B",
            "The Box Tops",
        );
        insert_pair(
            &conn,
            "SOAAAAA00000000001",
            "Blue Moon",
            190.5,
            "ARAAAAA0000000001",
            "Billie Holiday",
        );
        conn
    }

    fn insert_pair(
        conn: &Connection,
        song_id: &str,
        title: &str,
        duration: f64,
        artist_id: &str,
        artist_name: &str,
    ) {
        conn.execute(
            "INSERT OR IGNORE INTO artists (artist_id, name) VALUES (?1, ?2)",
            params![artist_id, artist_name],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO songs (song_id, title, artist_id, year, duration)
             VALUES (?1, ?2, ?3, 0, ?4)",
            params![song_id, title, artist_id, duration],
        )
        .unwrap();
    }

    #[test]
    fn test_exact_match_resolves() {
        let index = SongIndex::load(&catalog_db()).unwrap();
        let (song_id, artist_id) = index
            .resolve(Some("Soul Deep"), Some("The Box Tops"), Some(148.03955))
            .unwrap();
        assert_eq!(song_id, "SOSVXDR12AB0189D9D");
        assert_eq!(artist_id, "AR3HL1Q1187FB3DB2B");
    }

    #[test]
    fn test_miss_is_none() {
        let index = SongIndex::load(&catalog_db()).unwrap();
        assert!(index
            .resolve(Some("Soul Deep"), Some("The Box Tops"), Some(148.0))
            .is_none());
        assert!(index
            .resolve(Some("Unknown"), Some("Nobody"), Some(1.0))
            .is_none());
    }

    #[test]
    fn test_missing_hint_is_none() {
        let index = SongIndex::load(&catalog_db()).unwrap();
        assert!(index
            .resolve(None, Some("The Box Tops"), Some(148.03955))
            .is_none());
        assert!(index
            .resolve(Some("Soul Deep"), None, Some(148.03955))
            .is_none());
        assert!(index
            .resolve(Some("Soul Deep"), Some("The Box Tops"), None)
            .is_none());
    }

    #[test]
    fn test_tie_break_keeps_first_in_storage_order() {
        let conn = catalog_db();
        // A second song with the same (title, artist, duration) natural key.
        insert_pair(
            &conn,
            "SOSVXDR12AB0189D9E",
            "Soul Deep",
            148.03955,
            "AR3HL1Q1187FB3DB2B",
            "The Box Tops",
        );
        let index = SongIndex::load(&conn).unwrap();
        let (song_id, _) = index
            .resolve(Some("Soul Deep"), Some("The Box Tops"), Some(148.03955))
            .unwrap();
        assert_eq!(song_id, "SOSVXDR12AB0189D9D");
    }

    #[test]
    fn test_negative_zero_duration_matches_zero() {
        let conn = catalog_db();
        insert_pair(
            &conn,
            "SOQUIET0000000001",
            "Silence",
            0.0,
            "ARQUIET000000001",
            "Quiet Type",
        );
        let index = SongIndex::load(&conn).unwrap();
        let (song_id, _) = index
            .resolve(Some("Silence"), Some("Quiet Type"), Some(-0.0))
            .unwrap();
        assert_eq!(song_id, "SOQUIET0000000001");
    }

    #[test]
    fn test_empty_catalog() {
        let conn = Connection::open_in_memory().unwrap();
        create_star_schema(&conn).unwrap();
        let index = SongIndex::load(&conn).unwrap();
        assert!(index.is_empty());
        assert!(index
            .resolve(Some("Soul Deep"), Some("The Box Tops"), Some(148.03955))
            .is_none());
    }

    // The procedural lookup must agree with the SQL join the warehouse
    // pipeline uses for the same enrichment.
    #[test]
    fn test_agrees_with_sql_join() {
        let conn = catalog_db();
        let index = SongIndex::load(&conn).unwrap();

        let cases = [
            ("Soul Deep", "The Box Tops", 148.03955),
            ("Blue Moon", "Billie Holiday", 190.5),
            ("Soul Deep", "The Box Tops", 148.0),
            ("Blue Moon", "The Box Tops", 190.5),
        ];
        for (title, artist, duration) in cases {
            let joined: Option<(String, String)> = conn
                .query_row(
                    "SELECT s.song_id, a.artist_id
                     FROM songs s
                     JOIN artists a ON s.artist_id = a.artist_id
                     WHERE s.title = ?1 AND a.name = ?2 AND s.duration = ?3",
                    params![title, artist, duration],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()
                .unwrap();
            let resolved = index
                .resolve(Some(title), Some(artist), Some(duration))
                .map(|(s, a)| (s.to_string(), a.to_string()));
            assert_eq!(resolved, joined, "divergence for ({title}, {artist})");
        }
    }
}
