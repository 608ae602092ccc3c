use anyhow::Result;
use rusqlite::{params, OptionalExtension};

use crate::models::{Subject, SubjectRef};

use super::helpers::parse_kind;
use super::Database;

impl Database {
    /// Get a subject by id and kind
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub fn get_subject(&self, subject: SubjectRef) -> Result<Option<Subject>> {
        let result = self
            .conn
            .query_row(
                "SELECT id, kind, name FROM subjects WHERE id = ?1 AND kind = ?2",
                params![subject.id, subject.kind.as_str()],
                Self::row_to_subject,
            )
            .optional()?;

        Ok(result)
    }

    /// Get all subjects
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub fn get_all_subjects(&self) -> Result<Vec<Subject>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, kind, name FROM subjects ORDER BY kind, id")?;

        let subjects = stmt
            .query_map([], Self::row_to_subject)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(subjects)
    }

    /// Set the display name of a subject
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails or the subject does not exist
    pub fn set_subject_name(&self, subject: SubjectRef, name: &str) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE subjects SET name = ?1 WHERE id = ?2 AND kind = ?3",
            params![name, subject.id, subject.kind.as_str()],
        )?;
        if updated == 0 {
            anyhow::bail!("Unknown {subject}");
        }
        Ok(())
    }

    fn row_to_subject(row: &rusqlite::Row<'_>) -> rusqlite::Result<Subject> {
        let kind: String = row.get(1)?;
        Ok(Subject {
            id: row.get(0)?,
            kind: parse_kind(&kind, 1)?,
            name: row.get(2)?,
        })
    }
}
