use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of tracked subject. A snapshot belongs to exactly one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    Project,
    Group,
}

impl SubjectKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Group => "group",
        }
    }
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubjectKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "project" => Ok(Self::Project),
            "group" => Ok(Self::Group),
            _ => Err(format!("Invalid subject kind: {s}")),
        }
    }
}

/// Identifies a project or a group on the issue tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectRef {
    pub id: i64,
    pub kind: SubjectKind,
}

impl SubjectRef {
    #[must_use]
    pub fn project(id: i64) -> Self {
        Self {
            id,
            kind: SubjectKind::Project,
        }
    }

    #[must_use]
    pub fn group(id: i64) -> Self {
        Self {
            id,
            kind: SubjectKind::Group,
        }
    }
}

impl fmt::Display for SubjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

/// Subject record, created lazily on the first snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: i64,
    pub kind: SubjectKind,
    pub name: String,
}

/// Issue counters observed at one point in time.
///
/// `total == opened + closed` is expected from the producer but never enforced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub opened: i64,
    pub closed: i64,
    pub total: i64,
}

impl Counts {
    #[must_use]
    pub fn new(opened: i64, closed: i64, total: i64) -> Self {
        Self {
            opened,
            closed,
            total,
        }
    }
}

/// A single timestamped observation of a subject's issue counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub subject: SubjectRef,
    pub counts: Counts,
    /// Keeps the offset it was recorded with; ordering is done in UTC.
    pub taken_at: DateTime<FixedOffset>,
}

impl Snapshot {
    #[must_use]
    pub fn new(subject: SubjectRef, counts: Counts, taken_at: DateTime<FixedOffset>) -> Self {
        Self {
            subject,
            counts,
            taken_at,
        }
    }

    #[must_use]
    pub fn taken_at_utc(&self) -> DateTime<Utc> {
        self.taken_at.with_timezone(&Utc)
    }
}
