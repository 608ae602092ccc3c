use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Utc};
use rusqlite::{params, Transaction, TransactionBehavior};

use crate::models::{Counts, Snapshot, SubjectRef};

use super::helpers::{decode_failure, format_datetime, SnapshotRow};
use super::Database;

impl Database {
    /// Append a snapshot for a subject, creating the subject record if needed.
    ///
    /// Subject creation and snapshot insertion share one `IMMEDIATE`
    /// transaction so concurrent collectors never create the subject twice.
    /// Returns the new snapshot row id.
    ///
    /// # Errors
    ///
    /// Returns an error if the timestamp is outside the storable range or any insert fails
    pub fn add_snapshot(
        &self,
        subject: SubjectRef,
        counts: Counts,
        taken_at: DateTime<FixedOffset>,
    ) -> Result<i64> {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)
            .context("Failed to begin snapshot transaction")?;
        let snapshot_id = insert_snapshot(&tx, subject, counts, taken_at)?;
        tx.commit().context("Failed to commit snapshot")?;
        Ok(snapshot_id)
    }

    /// Snapshots of a subject taken in `[begin, end)`, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or a stored row cannot be decoded
    pub fn get_snapshots_between(
        &self,
        subject: SubjectRef,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Snapshot>> {
        let begin_ns = begin.timestamp_nanos_opt().unwrap_or(i64::MIN);
        let end_ns = end.timestamp_nanos_opt().unwrap_or(i64::MAX);

        let mut stmt = self.conn.prepare(
            "SELECT s.opened, s.closed, s.total, s.taken_at, ss.subject_id, ss.subject_kind
             FROM snapshots s
             JOIN subject_snapshots ss ON ss.snapshot_id = s.id
             WHERE ss.subject_id = ?1 AND ss.subject_kind = ?2
               AND s.taken_at_ns >= ?3 AND s.taken_at_ns < ?4
             ORDER BY s.taken_at_ns ASC, s.id ASC",
        )?;

        let snapshots = stmt
            .query_map(
                params![subject.id, subject.kind.as_str(), begin_ns, end_ns],
                SnapshotRow::from_row,
            )?
            .map(|row| row.and_then(SnapshotRow::into_snapshot))
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(decode_failure)?;

        Ok(snapshots)
    }

    /// Number of snapshots recorded for a subject
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub fn count_snapshots(&self, subject: SubjectRef) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM subject_snapshots WHERE subject_id = ?1 AND subject_kind = ?2",
            params![subject.id, subject.kind.as_str()],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

/// Insert one snapshot inside an open transaction, creating its subject on first use
pub(crate) fn insert_snapshot(
    tx: &Transaction<'_>,
    subject: SubjectRef,
    counts: Counts,
    taken_at: DateTime<FixedOffset>,
) -> Result<i64> {
    let taken_at_ns = storable_nanos(&taken_at)?;

    let created = tx.execute(
        "INSERT OR IGNORE INTO subjects (id, kind, name) VALUES (?1, ?2, '')",
        params![subject.id, subject.kind.as_str()],
    )?;
    if created > 0 {
        log::info!("Created new {subject}");
    }

    tx.execute(
        "INSERT INTO snapshots (opened, closed, total, taken_at, taken_at_ns)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            counts.opened,
            counts.closed,
            counts.total,
            format_datetime(&taken_at),
            taken_at_ns,
        ],
    )?;
    let snapshot_id = tx.last_insert_rowid();

    tx.execute(
        "INSERT INTO subject_snapshots (snapshot_id, subject_id, subject_kind)
         VALUES (?1, ?2, ?3)",
        params![snapshot_id, subject.id, subject.kind.as_str()],
    )?;

    log::debug!(
        "Recorded snapshot {snapshot_id} for {subject}: opened={} closed={} total={}",
        counts.opened,
        counts.closed,
        counts.total
    );
    Ok(snapshot_id)
}

/// Nanoseconds since the epoch, the ordering key of the `snapshots` table
pub(crate) fn storable_nanos(taken_at: &DateTime<FixedOffset>) -> Result<i64> {
    taken_at
        .timestamp_nanos_opt()
        .with_context(|| format!("Timestamp out of storable range: {taken_at}"))
}
