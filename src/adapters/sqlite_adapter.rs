//! SQLite event store.
//!
//! Events land in a local `breakout_failures` table. Re-running an analysis
//! over overlapping data does not duplicate rows: an event is identified by
//! ticker, location, failure time and break time.

use crate::domain::error::BreakoutError;
use crate::domain::failure::{FailureEvent, FailureLocation};
use crate::domain::ohlcv::{format_timestamp, parse_timestamp};
use crate::ports::config_port::ConfigPort;
use crate::ports::event_port::EventSink;
use chrono::NaiveDateTime;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn query_error(e: rusqlite::Error) -> BreakoutError {
    BreakoutError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn conversion_error(column: usize, raw: &str, what: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        rusqlite::types::Type::Text,
        format!("invalid {what}: {raw}").into(),
    )
}

fn parse_stored_time(column: usize, raw: &str) -> rusqlite::Result<NaiveDateTime> {
    parse_timestamp(raw).ok_or_else(|| conversion_error(column, raw, "timestamp"))
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, BreakoutError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| BreakoutError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4).max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool =
            Pool::builder()
                .max_size(pool_size)
                .build(manager)
                .map_err(|e: r2d2::Error| BreakoutError::Database {
                    reason: e.to_string(),
                })?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, BreakoutError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| BreakoutError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    fn connection(&self) -> Result<PooledConnection<SqliteConnectionManager>, BreakoutError> {
        self.pool
            .get()
            .map_err(|e: r2d2::Error| BreakoutError::Database {
                reason: e.to_string(),
            })
    }

    pub fn initialize_schema(&self) -> Result<(), BreakoutError> {
        let conn = self.connection()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS breakout_failures (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                company TEXT NOT NULL,
                ticker TEXT NOT NULL,
                location TEXT NOT NULL,
                failure_time TEXT NOT NULL,
                break_time TEXT,
                close_at_failure REAL
            );
            CREATE UNIQUE INDEX IF NOT EXISTS idx_failures_identity ON breakout_failures(
                ticker, location, failure_time, COALESCE(break_time, '')
            );
            CREATE INDEX IF NOT EXISTS idx_failures_ticker ON breakout_failures(ticker);",
        )
        .map_err(query_error)?;

        Ok(())
    }

    /// Stored events in insertion order, optionally for one ticker.
    pub fn fetch_failures(&self, ticker: Option<&str>) -> Result<Vec<FailureEvent>, BreakoutError> {
        let conn = self.connection()?;

        let query = "SELECT company, ticker, location, failure_time, break_time, close_at_failure
                     FROM breakout_failures
                     WHERE ?1 IS NULL OR ticker = ?1
                     ORDER BY id ASC";

        let mut stmt = conn.prepare(query).map_err(query_error)?;

        let rows = stmt
            .query_map(params![ticker], |row| {
                let location: String = row.get(2)?;
                let failure_time: String = row.get(3)?;
                let break_time: Option<String> = row.get(4)?;
                Ok(FailureEvent {
                    company: row.get(0)?,
                    ticker: row.get(1)?,
                    location: location
                        .parse::<FailureLocation>()
                        .map_err(|_| conversion_error(2, &location, "location"))?,
                    failure_time: parse_stored_time(3, &failure_time)?,
                    break_time: break_time
                        .as_deref()
                        .map(|raw| parse_stored_time(4, raw))
                        .transpose()?,
                    close_at_failure: row.get(5)?,
                })
            })
            .map_err(query_error)?;

        let mut events = Vec::new();
        for row in rows {
            events.push(row.map_err(query_error)?);
        }

        Ok(events)
    }
}

impl EventSink for SqliteAdapter {
    fn insert_failures(&self, events: &[FailureEvent]) -> Result<usize, BreakoutError> {
        let mut conn = self.connection()?;
        let tx = conn.transaction().map_err(query_error)?;

        let mut inserted = 0;
        for event in events {
            inserted += tx
                .execute(
                    "INSERT OR IGNORE INTO breakout_failures
                        (company, ticker, location, failure_time, break_time, close_at_failure)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        event.company,
                        event.ticker,
                        event.location.as_str(),
                        format_timestamp(&event.failure_time),
                        event.break_time.as_ref().map(format_timestamp),
                        event.close_at_failure,
                    ],
                )
                .map_err(query_error)?;
        }

        tx.commit().map_err(query_error)?;

        Ok(inserted)
    }
}
