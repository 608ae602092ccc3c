use anyhow::Result;
use rusqlite::Connection;

/// Initialize database schema
///
/// # Errors
///
/// Returns an error if database table creation or index creation fails
pub fn init_schema(conn: &Connection) -> Result<()> {
    // Subjects table - projects and groups being tracked
    conn.execute(
        "CREATE TABLE IF NOT EXISTS subjects (
            id INTEGER NOT NULL,
            kind TEXT NOT NULL CHECK (kind IN ('project', 'group')),
            name TEXT NOT NULL DEFAULT '',
            PRIMARY KEY (id, kind)
        )",
        [],
    )?;

    // Snapshots table - one row per collection run
    conn.execute(
        "CREATE TABLE IF NOT EXISTS snapshots (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            opened INTEGER NOT NULL,
            closed INTEGER NOT NULL,
            total INTEGER NOT NULL,
            taken_at TEXT NOT NULL,
            taken_at_ns INTEGER NOT NULL
        )",
        [],
    )?;

    // Association between snapshots and their subject
    conn.execute(
        "CREATE TABLE IF NOT EXISTS subject_snapshots (
            snapshot_id INTEGER NOT NULL PRIMARY KEY REFERENCES snapshots(id),
            subject_id INTEGER NOT NULL,
            subject_kind TEXT NOT NULL,
            FOREIGN KEY (subject_id, subject_kind) REFERENCES subjects(id, kind)
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_snapshots_taken_at ON snapshots(taken_at_ns)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_subject_snapshots_subject
         ON subject_snapshots(subject_id, subject_kind)",
        [],
    )?;

    log::debug!("Database schema initialized");
    Ok(())
}
