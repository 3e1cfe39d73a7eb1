//! SQLite persistence layer — the reference implementation of the
//! collaborator traits in `source.rs`.
//!
//! RULE: Only the store talks to the database.
//! The engine never executes SQL; the desk calls store methods.

use crate::{
    error::{EngineError, EngineResult},
    event::{EngineEvent, EventLogEntry},
    source::EventSink,
};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, types::Type, Connection, Row};
use std::str::FromStr;

mod goal;
mod register;
mod rendition;
mod transaction;

pub struct EngineStore {
    conn: Connection,
}

impl EngineStore {
    pub fn open(path: &str) -> EngineResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> EngineResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> EngineResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        Ok(())
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn events(&self) -> EngineResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, recorded_at, source, event_type, payload
             FROM event_log ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map([], |row| {
                Ok(EventLogEntry {
                    id:          Some(row.get(0)?),
                    recorded_at: parsed(row, 1)?,
                    source:      row.get(2)?,
                    event_type:  row.get(3)?,
                    payload:     row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn event_count(&self, event_type: &str) -> EngineResult<i64> {
        let n = self.conn.query_row(
            "SELECT COUNT(*) FROM event_log WHERE event_type = ?1",
            params![event_type],
            |row| row.get(0),
        )?;
        Ok(n)
    }
}

impl EventSink for EngineStore {
    fn append_event(
        &self,
        source: &str,
        recorded_at: DateTime<Utc>,
        event: &EngineEvent,
    ) -> EngineResult<()> {
        let entry = EventLogEntry::from_event(source, recorded_at, event)?;
        self.conn.execute(
            "INSERT INTO event_log (recorded_at, source, event_type, payload)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                ts_to_sql(entry.recorded_at),
                entry.source,
                entry.event_type,
                entry.payload,
            ],
        )?;
        Ok(())
    }
}

// ── Column codecs ──────────────────────────────────────────────

/// Fixed-width UTC form; lexical order equals chronological order.
pub(crate) fn ts_to_sql(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Read a TEXT column through `FromStr` (decimals, dates, enums).
pub(crate) fn parsed<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Read a JSON TEXT column.
pub(crate) fn json_col<T: serde::de::DeserializeOwned>(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Read a nullable JSON TEXT column.
pub(crate) fn json_opt_col<T: serde::de::DeserializeOwned>(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<T>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|r| serde_json::from_str(&r))
        .transpose()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn not_found(entity: &'static str, id: &str) -> EngineError {
    EngineError::NotFound {
        entity,
        id: id.to_string(),
    }
}
