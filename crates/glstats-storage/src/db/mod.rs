//! SQLite-backed snapshot store, split into domain-specific modules.

mod helpers;
mod legacy;
mod snapshots;
mod subjects;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Utc};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::migrations;
use crate::models::{Counts, Snapshot, Subject, SubjectRef};
use crate::store::SnapshotStore;

/// How long a writer waits on a lock held by another collector process
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Database connection wrapper
pub struct Database {
    pub(crate) conn: Connection,
}

impl Database {
    /// Open (and create if needed) the database file
    ///
    /// # Errors
    ///
    /// Returns an error if database directory creation, connection opening, or schema initialization fails
    pub fn new(db_path: Option<PathBuf>) -> Result<Self> {
        let path = db_path.unwrap_or_else(default_db_path);

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create database directory")?;
        }

        let conn = Connection::open(&path).context("Failed to open database connection")?;
        let db = Self::from_connection(conn)?;

        log::info!("Database initialized at: {}", path.display());
        Ok(db)
    }

    /// Open a private in-memory database
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be opened or the schema cannot be created
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)
            .context("Failed to set busy timeout")?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .context("Failed to enable foreign keys")?;
        migrations::init_schema(&conn)?;
        Ok(Self { conn })
    }
}

/// Default database location: `$HOME/.gitlab-stats/db.sqlite3`
#[must_use]
pub fn default_db_path() -> PathBuf {
    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(".gitlab-stats");
    path.push("db.sqlite3");
    path
}

/// Sibling path of the legacy JSON database (`db.sqlite3` -> `db.json`)
#[must_use]
pub fn legacy_json_path(db_path: &Path) -> PathBuf {
    db_path.with_extension("json")
}

impl SnapshotStore for Database {
    fn insert_snapshot(
        &self,
        subject: SubjectRef,
        counts: Counts,
        taken_at: DateTime<FixedOffset>,
    ) -> Result<()> {
        self.add_snapshot(subject, counts, taken_at).map(|_| ())
    }

    fn query_range(
        &self,
        subject: SubjectRef,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Snapshot>> {
        self.get_snapshots_between(subject, begin, end)
    }

    fn get_subject(&self, subject: SubjectRef) -> Result<Option<Subject>> {
        Database::get_subject(self, subject)
    }
}
