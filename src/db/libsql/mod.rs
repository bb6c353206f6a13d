//! libSQL backend for the `Database` trait.
//!
//! Each call opens a fresh connection from the shared `libsql::Database`
//! handle. Foreign-key enforcement is per connection in SQLite, so
//! `connect()` turns it on every time; the cascade/nullify behavior of the
//! schema depends on it.

mod case_files;
mod directory;
mod tasks;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use libsql::{Connection, Row, Value};

use crate::db::Database;
use crate::db::libsql_migrations::SCHEMA;
use crate::error::DatabaseError;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const BUSY_TIMEOUT_MS: u32 = 5_000;

/// libSQL database backend.
pub struct LibSqlBackend {
    db: libsql::Database,
    path: PathBuf,
}

impl LibSqlBackend {
    /// Open (or create) a local database file.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        ensure_parent_dir(path)?;
        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("failed to open {}: {}", path.display(), e)))?;
        Ok(Self {
            db,
            path: path.to_path_buf(),
        })
    }

    /// Open a local replica that syncs from a remote libSQL/Turso database.
    pub async fn new_remote_replica(
        path: &Path,
        url: &str,
        auth_token: &str,
    ) -> Result<Self, DatabaseError> {
        ensure_parent_dir(path)?;
        let db =
            libsql::Builder::new_remote_replica(path, url.to_string(), auth_token.to_string())
                .build()
                .await
                .map_err(|e| DatabaseError::Pool(format!("failed to open replica: {}", e)))?;
        db.sync()
            .await
            .map_err(|e| DatabaseError::Pool(format!("initial replica sync failed: {}", e)))?;
        Ok(Self {
            db,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a connection with foreign keys enforced.
    pub async fn connect(&self) -> Result<Connection, DatabaseError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("failed to connect: {}", e)))?;
        conn.execute("PRAGMA foreign_keys = ON", ()).await?;
        // busy_timeout reports the new value as a row, so it goes through query().
        conn.query(&format!("PRAGMA busy_timeout = {BUSY_TIMEOUT_MS}"), ())
            .await?;
        Ok(conn)
    }
}

fn ensure_parent_dir(path: &Path) -> Result<(), DatabaseError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            DatabaseError::Pool(format!(
                "failed to create database directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }
    Ok(())
}

#[async_trait]
impl Database for LibSqlBackend {
    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        let conn = self.connect().await?;
        conn.execute_batch(SCHEMA)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;
        tracing::debug!(path = %self.path.display(), "libSQL schema applied");
        Ok(())
    }
}

// ==================== Value helpers ====================

pub(crate) fn fmt_ts(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp: RFC 3339, or SQLite's `datetime('now')` format.
pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DatabaseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| DatabaseError::Serialization(format!("invalid timestamp '{}': {}", raw, e)))
}

pub(crate) fn fmt_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|e| DatabaseError::Serialization(format!("invalid date '{}': {}", raw, e)))
}

pub(crate) fn parse_date_opt(raw: Option<String>) -> Result<Option<NaiveDate>, DatabaseError> {
    raw.map(|value| parse_date(&value)).transpose()
}

/// Date-times are stored zero-padded so lexical order is chronological order.
pub(crate) fn fmt_datetime(dt: NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

pub(crate) fn parse_datetime(raw: &str) -> Result<NaiveDateTime, DatabaseError> {
    NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT)
        .map_err(|e| DatabaseError::Serialization(format!("invalid datetime '{}': {}", raw, e)))
}

pub(crate) fn get_text(row: &Row, idx: i32) -> String {
    match row.get_value(idx) {
        Ok(Value::Text(s)) => s,
        Ok(Value::Integer(i)) => i.to_string(),
        _ => String::new(),
    }
}

pub(crate) fn get_opt_text(row: &Row, idx: i32) -> Option<String> {
    match row.get_value(idx) {
        Ok(Value::Text(s)) => Some(s),
        _ => None,
    }
}

pub(crate) fn get_i64(row: &Row, idx: i32) -> i64 {
    match row.get_value(idx) {
        Ok(Value::Integer(i)) => i,
        _ => 0,
    }
}

pub(crate) fn get_opt_i64(row: &Row, idx: i32) -> Option<i64> {
    match row.get_value(idx) {
        Ok(Value::Integer(i)) => Some(i),
        _ => None,
    }
}

pub(crate) fn opt_text(value: Option<&str>) -> Value {
    match value {
        Some(s) => Value::Text(s.to_string()),
        None => Value::Null,
    }
}

pub(crate) fn opt_i64(value: Option<i64>) -> Value {
    match value {
        Some(i) => Value::Integer(i),
        None => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_timestamp_accepts_rfc3339_and_sqlite_format() {
        let rfc = parse_timestamp("2025-03-01T10:20:30.000001Z").expect("rfc3339");
        assert_eq!(fmt_ts(&rfc), "2025-03-01T10:20:30.000001Z");

        let sqlite = parse_timestamp("2025-03-01 10:20:30").expect("sqlite format");
        assert_eq!(sqlite.to_rfc3339(), "2025-03-01T10:20:30+00:00");

        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn stored_datetimes_sort_chronologically() {
        let early = NaiveDate::from_ymd_opt(2025, 1, 9)
            .and_then(|d| d.and_hms_opt(9, 0, 0))
            .expect("valid");
        let late = NaiveDate::from_ymd_opt(2025, 1, 10)
            .and_then(|d| d.and_hms_opt(8, 0, 0))
            .expect("valid");
        assert!(fmt_datetime(early) < fmt_datetime(late));
        assert_eq!(parse_datetime(&fmt_datetime(late)).expect("parse"), late);
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let tmpdir = tempfile::tempdir().expect("tempdir");
        let backend = LibSqlBackend::new_local(&tmpdir.path().join("nested/casedesk.db"))
            .await
            .expect("backend");
        backend.run_migrations().await.expect("first run");
        backend.run_migrations().await.expect("second run");

        let conn = backend.connect().await.expect("connect");
        for table in [
            "law_firms",
            "law_firm_notes",
            "lawyers",
            "lawyer_notes",
            "companies",
            "company_notes",
            "cases",
            "case_events",
            "case_notes",
            "tasks",
            "task_notes",
            "document_references",
        ] {
            let row = conn
                .query(
                    "SELECT name FROM sqlite_master WHERE type='table' AND name=?1",
                    libsql::params![table],
                )
                .await
                .expect("query")
                .next()
                .await
                .expect("row");
            assert!(row.is_some(), "missing table {table}");
        }
    }
}
