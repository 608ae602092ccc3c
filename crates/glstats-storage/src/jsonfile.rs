//! Lightweight snapshot store backed by a flat JSON array file.
//!
//! Each element is `{"dateExec", "subjectID", "subjectKind", "counts"}`. The
//! whole file is rewritten on every insert, through a temporary sibling file
//! that is renamed over the original.

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::CorruptRecord;
use crate::models::{Counts, Snapshot, Subject, SubjectKind, SubjectRef};
use crate::store::SnapshotStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonRecord {
    date_exec: DateTime<FixedOffset>,
    #[serde(rename = "subjectID")]
    subject_id: i64,
    subject_kind: SubjectKind,
    counts: JsonCounts,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct JsonCounts {
    #[serde(default)]
    all: i64,
    #[serde(default)]
    closed: i64,
    #[serde(default)]
    opened: i64,
}

impl JsonRecord {
    fn subject(&self) -> SubjectRef {
        SubjectRef {
            id: self.subject_id,
            kind: self.subject_kind,
        }
    }

    fn taken_at_utc(&self) -> DateTime<Utc> {
        self.date_exec.with_timezone(&Utc)
    }

    /// Counters must be non-negative, as in the SQLite store
    fn into_snapshot(self) -> std::result::Result<Snapshot, CorruptRecord> {
        let JsonCounts { all, closed, opened } = self.counts;
        if let Some(bad) = [opened, closed, all].into_iter().find(|c| *c < 0) {
            return Err(CorruptRecord {
                what: "JSON store",
                message: format!(
                    "negative counter {bad} for {} at {}",
                    self.subject(),
                    self.date_exec
                ),
            });
        }
        Ok(Snapshot {
            subject: self.subject(),
            counts: Counts::new(opened, closed, all),
            taken_at: self.date_exec,
        })
    }
}

/// Snapshot store persisted as a single JSON file
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing or empty file is an empty store
    fn read_records(&self) -> Result<Vec<JsonRecord>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read {}", self.path.display()))
            }
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content)
            .map_err(|e| CorruptRecord {
                what: "JSON store",
                message: e.to_string(),
            })
            .with_context(|| format!("Invalid JSON store {}", self.path.display()))
    }

    fn write_records(&self, records: &[JsonRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create store directory")?;
        }
        let json = serde_json::to_string_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

impl SnapshotStore for JsonFileStore {
    fn insert_snapshot(
        &self,
        subject: SubjectRef,
        counts: Counts,
        taken_at: DateTime<FixedOffset>,
    ) -> Result<()> {
        let mut records = self.read_records()?;
        records.push(JsonRecord {
            date_exec: taken_at,
            subject_id: subject.id,
            subject_kind: subject.kind,
            counts: JsonCounts {
                all: counts.total,
                closed: counts.closed,
                opened: counts.opened,
            },
        });
        self.write_records(&records)?;
        log::debug!("Appended snapshot for {subject} to {}", self.path.display());
        Ok(())
    }

    fn query_range(
        &self,
        subject: SubjectRef,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Snapshot>> {
        let mut snapshots: Vec<Snapshot> = self
            .read_records()?
            .into_iter()
            .filter(|r| r.subject() == subject)
            .filter(|r| {
                let at = r.taken_at_utc();
                at >= begin && at < end
            })
            .map(JsonRecord::into_snapshot)
            .collect::<std::result::Result<_, _>>()
            .with_context(|| format!("Invalid record in {}", self.path.display()))?;
        // Stable: equal instants keep insertion order
        snapshots.sort_by_key(Snapshot::taken_at_utc);
        Ok(snapshots)
    }

    fn get_subject(&self, subject: SubjectRef) -> Result<Option<Subject>> {
        let known = self.read_records()?.iter().any(|r| r.subject() == subject);
        Ok(known.then(|| Subject {
            id: subject.id,
            kind: subject.kind,
            name: String::new(),
        }))
    }
}
