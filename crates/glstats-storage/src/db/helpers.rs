//! Typed decoding of stored rows.
//!
//! Rows are decoded exactly once here; everything above the storage layer only
//! sees `i64` counters and `DateTime` values.

use chrono::{DateTime, FixedOffset, SecondsFormat};
use rusqlite::types::Type;
use rusqlite::Row;

use crate::error::CorruptRecord;
use crate::models::{Counts, Snapshot, SubjectKind, SubjectRef};

/// Columns of a joined `snapshots` / `subject_snapshots` row.
///
/// Queries must select, in order:
/// `opened, closed, total, taken_at, subject_id, subject_kind`.
#[derive(Debug)]
pub(crate) struct SnapshotRow {
    opened: i64,
    closed: i64,
    total: i64,
    taken_at: String,
    subject_id: i64,
    subject_kind: String,
}

impl SnapshotRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            opened: row.get(0)?,
            closed: row.get(1)?,
            total: row.get(2)?,
            taken_at: row.get(3)?,
            subject_id: row.get(4)?,
            subject_kind: row.get(5)?,
        })
    }

    pub(crate) fn into_snapshot(self) -> rusqlite::Result<Snapshot> {
        let kind = parse_kind(&self.subject_kind, 5)?;
        Ok(Snapshot {
            subject: SubjectRef {
                id: self.subject_id,
                kind,
            },
            counts: Counts {
                opened: non_negative(self.opened, 0)?,
                closed: non_negative(self.closed, 1)?,
                total: non_negative(self.total, 2)?,
            },
            taken_at: parse_datetime(&self.taken_at, 3)?,
        })
    }
}

/// Format a timestamp for storage, keeping its offset and sub-second precision
pub(crate) fn format_datetime(dt: &DateTime<FixedOffset>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

/// Parse an RFC3339 datetime string from database, returning a rusqlite error on failure.
pub(crate) fn parse_datetime(s: &str, column: usize) -> rusqlite::Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(s)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

pub(crate) fn parse_kind(s: &str, column: usize) -> rusqlite::Result<SubjectKind> {
    s.parse::<SubjectKind>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, e.into()))
}

/// Row conversion failures become [`CorruptRecord`], anything else stays a database error
pub(crate) fn decode_failure(err: rusqlite::Error) -> anyhow::Error {
    match err {
        rusqlite::Error::FromSqlConversionFailure(..) | rusqlite::Error::InvalidColumnType(..) => {
            CorruptRecord {
                what: "snapshot row",
                message: err.to_string(),
            }
            .into()
        }
        other => other.into(),
    }
}

fn non_negative(value: i64, column: usize) -> rusqlite::Result<i64> {
    if value < 0 {
        return Err(rusqlite::Error::FromSqlConversionFailure(
            column,
            Type::Integer,
            format!("negative counter: {value}").into(),
        ));
    }
    Ok(value)
}
