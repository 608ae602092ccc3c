use anyhow::Result;
use chrono::{DateTime, FixedOffset, Utc};

use crate::models::{Counts, Snapshot, Subject, SubjectRef};

/// Append-only snapshot persistence shared by the SQLite and JSON backends
pub trait SnapshotStore {
    /// Append a snapshot, creating the subject record on first write
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage fails
    fn insert_snapshot(
        &self,
        subject: SubjectRef,
        counts: Counts,
        taken_at: DateTime<FixedOffset>,
    ) -> Result<()>;

    /// Snapshots of `subject` taken in `[begin, end)`, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage fails or a stored row cannot be decoded
    fn query_range(
        &self,
        subject: SubjectRef,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Snapshot>>;

    /// Look up a subject record
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage fails
    fn get_subject(&self, subject: SubjectRef) -> Result<Option<Subject>>;
}
