// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Persistent per-device status records backed by SQLite.
//
// One row per device, updated in place on every poll attempt and never
// deleted here. List fields are stored as JSON text.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info, instrument};

use printpulse_core::error::{PrintpulseError, Result};
use printpulse_core::types::{DeviceId, PrinterStatus};

/// SQLite schema for the status table.
const CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS printer_status (
        device_id INTEGER PRIMARY KEY,
        status_code INTEGER NOT NULL DEFAULT 0,
        status_label TEXT NOT NULL DEFAULT '',
        device_status_code INTEGER,
        device_status_label TEXT NOT NULL DEFAULT '',
        error_state_raw TEXT NOT NULL DEFAULT '',
        error_flags TEXT NOT NULL DEFAULT '[]',
        alerts TEXT NOT NULL DEFAULT '[]',
        supplies TEXT NOT NULL DEFAULT '[]',
        console_lines TEXT NOT NULL DEFAULT '[]',
        attention INTEGER NOT NULL DEFAULT 0,
        snmp_ok INTEGER NOT NULL DEFAULT 1,
        snmp_message TEXT NOT NULL DEFAULT '',
        fetched_at TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
"#;

const SELECT_COLUMNS: &str = "SELECT device_id, status_code, status_label, device_status_code,
        device_status_label, error_state_raw, error_flags, alerts, supplies,
        console_lines, attention, snmp_ok, snmp_message, fetched_at, created_at,
        updated_at
 FROM printer_status";

/// Status records keyed by device.
///
/// Synchronous, like every `rusqlite` API. Callers in async code keep the
/// connection behind a mutex and never hold it across an await.
pub struct StatusStore {
    conn: Connection,
}

impl StatusStore {
    /// Open (or create) the status database at `path`, in WAL mode.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| PrintpulseError::Database(format!("open: {e}")))?;

        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| PrintpulseError::Database(format!("WAL pragma: {e}")))?;

        conn.execute_batch(CREATE_TABLE_SQL)
            .map_err(|e| PrintpulseError::Database(format!("create table: {e}")))?;

        info!("status database opened");
        Ok(Self { conn })
    }

    /// Open an in-memory database (useful for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| PrintpulseError::Database(format!("open in-memory: {e}")))?;

        conn.execute_batch(CREATE_TABLE_SQL)
            .map_err(|e| PrintpulseError::Database(format!("create table: {e}")))?;

        debug!("in-memory status database opened");
        Ok(Self { conn })
    }

    /// Insert or replace the record for `status.device_id`.
    ///
    /// `created_at` is written on first insert only.
    #[instrument(skip(self, status), fields(device = %status.device_id))]
    pub fn upsert(&self, status: &PrinterStatus) -> Result<()> {
        let error_flags = to_json("error_flags", &status.error_flags)?;
        let alerts = to_json("alerts", &status.alerts)?;
        let supplies = to_json("supplies", &status.supplies)?;
        let console_lines = to_json("console_lines", &status.console_lines)?;

        self.conn
            .execute(
                "INSERT INTO printer_status (device_id, status_code, status_label,
                 device_status_code, device_status_label, error_state_raw, error_flags,
                 alerts, supplies, console_lines, attention, snmp_ok, snmp_message,
                 fetched_at, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
                 ON CONFLICT(device_id) DO UPDATE SET
                    status_code = excluded.status_code,
                    status_label = excluded.status_label,
                    device_status_code = excluded.device_status_code,
                    device_status_label = excluded.device_status_label,
                    error_state_raw = excluded.error_state_raw,
                    error_flags = excluded.error_flags,
                    alerts = excluded.alerts,
                    supplies = excluded.supplies,
                    console_lines = excluded.console_lines,
                    attention = excluded.attention,
                    snmp_ok = excluded.snmp_ok,
                    snmp_message = excluded.snmp_message,
                    fetched_at = excluded.fetched_at,
                    updated_at = excluded.updated_at",
                params![
                    status.device_id.0,
                    status.status_code,
                    status.status_label,
                    status.device_status_code,
                    status.device_status_label,
                    status.error_state_raw,
                    error_flags,
                    alerts,
                    supplies,
                    console_lines,
                    status.attention,
                    status.snmp_ok,
                    status.snmp_message,
                    status.fetched_at.map(|t| t.to_rfc3339()),
                    status.created_at.to_rfc3339(),
                    status.updated_at.to_rfc3339(),
                ],
            )
            .map_err(|e| PrintpulseError::Database(format!("upsert status: {e}")))?;

        debug!(device = %status.device_id, snmp_ok = status.snmp_ok, "status stored");
        Ok(())
    }

    /// The record for one device, or `None` if it was never polled.
    #[instrument(skip(self), fields(device = %device_id))]
    pub fn get(&self, device_id: DeviceId) -> Result<Option<PrinterStatus>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{SELECT_COLUMNS} WHERE device_id = ?1"))
            .map_err(|e| PrintpulseError::Database(format!("prepare get: {e}")))?;

        stmt.query_row(params![device_id.0], row_to_status)
            .optional()
            .map_err(|e| PrintpulseError::Database(format!("query get: {e}")))
    }

    /// Records for the given devices, in the order asked. Devices without a
    /// record are left out.
    #[instrument(skip_all, fields(count = device_ids.len()))]
    pub fn get_many(&self, device_ids: &[DeviceId]) -> Result<Vec<PrinterStatus>> {
        let mut found = Vec::with_capacity(device_ids.len());
        for &id in device_ids {
            if let Some(status) = self.get(id)? {
                found.push(status);
            }
        }
        debug!(requested = device_ids.len(), found = found.len(), "bulk status lookup");
        Ok(found)
    }

    /// Every stored record, ordered by device id.
    #[instrument(skip(self))]
    pub fn all(&self) -> Result<Vec<PrinterStatus>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_COLUMNS} ORDER BY device_id ASC"))
            .map_err(|e| PrintpulseError::Database(format!("prepare all: {e}")))?;

        let records = stmt
            .query_map([], row_to_status)
            .map_err(|e| PrintpulseError::Database(format!("query all: {e}")))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| PrintpulseError::Database(format!("collect rows: {e}")))?;

        debug!(count = records.len(), "retrieved all status records");
        Ok(records)
    }
}

fn to_json<T: serde::Serialize>(field: &str, value: &T) -> Result<String> {
    serde_json::to_string(value)
        .map_err(|e| PrintpulseError::Database(format!("serialize {field}: {e}")))
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn conversion_error(
    column: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
}

fn json_column<T: serde::de::DeserializeOwned>(row: &rusqlite::Row<'_>, column: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(column)?;
    serde_json::from_str(&raw).map_err(|e| conversion_error(column, e))
}

fn time_column(row: &rusqlite::Row<'_>, column: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(column)?;
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| conversion_error(column, e))
    })
    .transpose()
}

fn required_time(row: &rusqlite::Row<'_>, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    time_column(row, column)?.ok_or(rusqlite::Error::InvalidColumnType(
        column,
        "timestamp".into(),
        rusqlite::types::Type::Null,
    ))
}

/// Column indices must match `SELECT_COLUMNS`.
fn row_to_status(row: &rusqlite::Row<'_>) -> rusqlite::Result<PrinterStatus> {
    Ok(PrinterStatus {
        device_id: DeviceId(row.get(0)?),
        status_code: row.get(1)?,
        status_label: row.get(2)?,
        device_status_code: row.get(3)?,
        device_status_label: row.get(4)?,
        error_state_raw: row.get(5)?,
        error_flags: json_column(row, 6)?,
        alerts: json_column(row, 7)?,
        supplies: json_column(row, 8)?,
        console_lines: json_column(row, 9)?,
        attention: row.get(10)?,
        snmp_ok: row.get(11)?,
        snmp_message: row.get(12)?,
        fetched_at: time_column(row, 13)?,
        created_at: required_time(row, 14)?,
        updated_at: required_time(row, 15)?,
    })
}
