//! The staged warehouse pipeline: bulk copy into staging tables, then
//! set-based SQL transforms into the final star schema.
//!
//! The loader never owns a connection; it drives any [`SqlExecutor`], so the
//! connection provisioning stays with the caller. Copy operations are treated
//! as atomic, provider-managed steps — there is no partial-copy recovery.

pub mod queries;

use crate::discovery::discover_files;
use crate::extract::{read_records, EventRecord, SongRecord};
use anyhow::{Context, Result};
use queries::WarehouseQueries;
use rusqlite::{params, Connection};
use std::path::Path;
use tracing::info;

/// Minimal execution surface the warehouse loader needs.
pub trait SqlExecutor {
    fn execute(&mut self, sql: &str) -> Result<usize>;
}

impl SqlExecutor for Connection {
    fn execute(&mut self, sql: &str) -> Result<usize> {
        let rows = Connection::execute(self, sql, [])
            .with_context(|| format!("statement failed: {}", first_line(sql)))?;
        Ok(rows)
    }
}

fn first_line(sql: &str) -> &str {
    sql.lines().next().unwrap_or(sql).trim()
}

/// Orchestrates one warehouse load from a prebuilt statement set.
pub struct WarehouseLoader {
    queries: WarehouseQueries,
}

impl WarehouseLoader {
    pub fn new(queries: WarehouseQueries) -> Self {
        Self { queries }
    }

    pub fn queries(&self) -> &WarehouseQueries {
        &self.queries
    }

    /// Drop and recreate staging and final tables.
    pub fn recreate_tables<E: SqlExecutor>(&self, exec: &mut E) -> Result<()> {
        for sql in self.queries.drop_statements() {
            exec.execute(sql)?;
        }
        for sql in self.queries.create_statements() {
            exec.execute(sql)?;
        }
        info!("warehouse tables recreated");
        Ok(())
    }

    /// Phase one: bulk-copy raw files into the staging tables.
    pub fn stage<E: SqlExecutor>(&self, exec: &mut E) -> Result<()> {
        for sql in self.queries.copy_statements() {
            info!("running staging copy: {}", first_line(sql));
            exec.execute(sql)?;
        }
        Ok(())
    }

    /// Phase one for a local directory source: read newline-delimited JSON
    /// files under the two directories and bulk-insert them into staging,
    /// all inside a single transaction.
    pub fn stage_local(
        &self,
        conn: &mut Connection,
        log_dir: &Path,
        song_dir: &Path,
    ) -> Result<()> {
        let tx = conn.transaction()?;
        let mut event_rows = 0usize;
        let mut song_rows = 0usize;
        {
            let mut insert_event = tx.prepare(
                "INSERT INTO staging_events
                     (artist, auth, firstName, gender, itemInSession, lastName, length, level,
                      location, method, page, registration, sessionId, song, status, ts,
                      userAgent, userId)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
            )?;
            for file in discover_files(log_dir, "json") {
                let records: Vec<EventRecord> = read_records(&file)?;
                for record in &records {
                    insert_event.execute(params![
                        record.artist,
                        record.auth,
                        record.first_name,
                        record.gender.map(|g| g.as_str()),
                        record.item_in_session,
                        record.last_name,
                        record.length,
                        record.level.as_str(),
                        record.location,
                        record.method,
                        record.page,
                        record.registration,
                        record.session_id,
                        record.song,
                        record.status,
                        record.ts,
                        record.user_agent,
                        record.user_id,
                    ])?;
                }
                event_rows += records.len();
            }

            let mut insert_song = tx.prepare(
                "INSERT INTO staging_songs
                     (artist_id, artist_latitude, artist_longitude, artist_location,
                      artist_name, song_id, title, duration, year)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for file in discover_files(song_dir, "json") {
                let records: Vec<SongRecord> = read_records(&file)?;
                for record in &records {
                    insert_song.execute(params![
                        record.artist_id,
                        record.artist_latitude,
                        record.artist_longitude,
                        record.artist_location,
                        record.artist_name,
                        record.song_id,
                        record.title,
                        record.duration,
                        record.year,
                    ])?;
                }
                song_rows += records.len();
            }
        }
        tx.commit()?;
        info!("staged {} event rows, {} song rows", event_rows, song_rows);
        Ok(())
    }

    /// Phase two: populate the final tables from staging. The fact table is
    /// loaded first; `time` is derived from it and runs last.
    pub fn transform<E: SqlExecutor>(&self, exec: &mut E) -> Result<()> {
        for sql in self.queries.insert_statements() {
            let rows = exec.execute(sql)?;
            info!("{}: {} rows", first_line(sql), rows);
        }
        Ok(())
    }

    /// Full load against a warehouse: copy, then transform.
    pub fn run<E: SqlExecutor>(&self, exec: &mut E) -> Result<()> {
        self.stage(exec)?;
        self.transform(exec)?;
        Ok(())
    }
}
