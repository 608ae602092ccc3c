//! Import of the legacy single-file JSON database.
//!
//! The old format is `{"Records": [{"dateExec", "projectId", "groupId", "counts"}]}`,
//! where exactly one of `projectId` / `groupId` is non-zero.

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use rusqlite::{Transaction, TransactionBehavior};
use serde::Deserialize;
use std::path::Path;

use crate::models::{Counts, SubjectRef};

use super::snapshots::{insert_snapshot, storable_nanos};
use super::Database;

#[derive(Debug, Default, Deserialize)]
struct LegacyDatabase {
    #[serde(rename = "Records", default)]
    records: Option<Vec<LegacyRecord>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyRecord {
    date_exec: DateTime<FixedOffset>,
    #[serde(default)]
    project_id: i64,
    #[serde(default)]
    group_id: i64,
    #[serde(default)]
    counts: LegacyCounts,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
struct LegacyCounts {
    #[serde(default)]
    all: i64,
    #[serde(default)]
    closed: i64,
    #[serde(default)]
    opened: i64,
}

impl LegacyRecord {
    fn subject(&self) -> Option<SubjectRef> {
        if self.project_id != 0 {
            Some(SubjectRef::project(self.project_id))
        } else if self.group_id != 0 {
            Some(SubjectRef::group(self.group_id))
        } else {
            None
        }
    }

    fn counts(&self) -> Option<Counts> {
        let LegacyCounts { all, closed, opened } = self.counts;
        (opened >= 0 && closed >= 0 && all >= 0).then(|| Counts::new(opened, closed, all))
    }
}

impl Database {
    /// Import every record of a legacy JSON database file.
    ///
    /// The import runs in a single transaction: either every usable record is
    /// stored or none is. Records naming neither a project nor a group, with a
    /// negative counter, or with a timestamp outside the storable range are
    /// skipped with a warning. Returns the number of imported snapshots.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or an insert fails
    pub fn import_legacy_json(&self, path: &Path) -> Result<usize> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read legacy database {}", path.display()))?;
        self.import_legacy_str(&content)
            .with_context(|| format!("Failed to import legacy database {}", path.display()))
    }

    fn import_legacy_str(&self, content: &str) -> Result<usize> {
        if content.trim().is_empty() {
            return Ok(0);
        }
        let legacy: LegacyDatabase =
            serde_json::from_str(content).context("Invalid legacy JSON database")?;

        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)
            .context("Failed to begin import transaction")?;

        let mut imported = 0;
        for record in legacy.records.unwrap_or_default() {
            let Some(subject) = record.subject() else {
                log::warn!("Skipping legacy record without subject at {}", record.date_exec);
                continue;
            };
            let Some(counts) = record.counts() else {
                log::warn!(
                    "Skipping legacy record for {subject} at {} with negative counters",
                    record.date_exec
                );
                continue;
            };
            if let Err(e) = storable_nanos(&record.date_exec) {
                log::warn!("Skipping legacy record for {subject}: {e}");
                continue;
            }
            insert_snapshot(&tx, subject, counts, record.date_exec)?;
            imported += 1;
        }

        tx.commit().context("Failed to commit legacy import")?;
        log::info!("Imported {imported} legacy snapshots");
        Ok(imported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const LEGACY: &str = r#"{"Records":[
        {"dateExec":"2023-01-15T08:00:00.123+01:00","projectId":12,"groupId":0,
         "counts":{"all":30,"closed":10,"opened":20}},
        {"dateExec":"2023-02-15T08:00:00+01:00","projectId":0,"groupId":4,
         "counts":{"all":5,"opened":5}},
        {"dateExec":"2023-03-15T08:00:00Z","projectId":0,"groupId":0,
         "counts":{}}
    ]}"#;

    #[test]
    fn test_import_legacy_records() {
        let db = Database::open_in_memory().unwrap();
        let imported = db.import_legacy_str(LEGACY).unwrap();
        assert_eq!(imported, 2);

        let begin = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let project = db
            .get_snapshots_between(SubjectRef::project(12), begin, end)
            .unwrap();
        assert_eq!(project.len(), 1);
        assert_eq!(project[0].counts, Counts::new(20, 10, 30));
        assert_eq!(
            project[0].taken_at,
            DateTime::parse_from_rfc3339("2023-01-15T08:00:00.123+01:00").unwrap()
        );

        let group = db
            .get_snapshots_between(SubjectRef::group(4), begin, end)
            .unwrap();
        assert_eq!(group[0].counts, Counts::new(5, 0, 5));
    }

    #[test]
    fn test_import_empty_and_null_records() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.import_legacy_str("").unwrap(), 0);
        assert_eq!(db.import_legacy_str(r#"{"Records":null}"#).unwrap(), 0);
        assert!(db.import_legacy_str("not json").is_err());
    }

    #[test]
    fn test_unusable_records_are_skipped() {
        let db = Database::open_in_memory().unwrap();
        let content = r#"{"Records":[
            {"dateExec":"2023-01-15T08:00:00Z","projectId":12,
             "counts":{"all":3,"closed":1,"opened":2}},
            {"dateExec":"0001-01-01T00:00:00Z","projectId":12,
             "counts":{"all":4,"closed":1,"opened":3}},
            {"dateExec":"2023-02-15T08:00:00Z","projectId":12,
             "counts":{"all":-1,"opened":-1}},
            {"dateExec":"2023-03-15T08:00:00Z","projectId":12,
             "counts":{"all":5,"closed":2,"opened":3}}
        ]}"#;

        assert_eq!(db.import_legacy_str(content).unwrap(), 2);

        let begin = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let counts: Vec<Counts> = db
            .get_snapshots_between(SubjectRef::project(12), begin, end)
            .unwrap()
            .into_iter()
            .map(|s| s.counts)
            .collect();
        assert_eq!(counts, vec![Counts::new(2, 1, 3), Counts::new(3, 2, 5)]);
    }

    #[test]
    fn test_failed_import_leaves_no_rows() {
        let db = Database::open_in_memory().unwrap();
        // The second record is refused after the first one went in
        db.conn
            .execute_batch(
                "CREATE TRIGGER reject_small BEFORE INSERT ON snapshots
                 WHEN NEW.total = 5
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();

        assert!(db.import_legacy_str(LEGACY).is_err());
        assert_eq!(db.count_snapshots(SubjectRef::project(12)).unwrap(), 0);
        assert!(db.get_all_subjects().unwrap().is_empty());

        // The connection is usable again after the rollback
        db.conn.execute_batch("DROP TRIGGER reject_small;").unwrap();
        assert_eq!(db.import_legacy_str(LEGACY).unwrap(), 2);
    }

    #[test]
    fn test_import_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        std::fs::write(&path, LEGACY).unwrap();

        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.import_legacy_json(&path).unwrap(), 2);
        assert!(db.import_legacy_json(&dir.path().join("missing.json")).is_err());
    }
}
