//! Error kinds surfaced by the aggregation engine.

use glstats_storage::SubjectRef;

#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    /// Unknown subject, or no snapshot inside the requested range
    #[error("No statistics found for {subject}: {reason}")]
    NotFound { subject: SubjectRef, reason: String },

    /// Malformed API payload or stored value
    #[error("Failed to decode {what}: {message}")]
    Decode { what: String, message: String },

    /// Aligned series ended up with different lengths
    #[error("All series should have the same length (expected {expected}, got {got} for {series})")]
    SeriesLengthMismatch {
        series: &'static str,
        expected: usize,
        got: usize,
    },

    /// Caller-supplied value the engine cannot work with
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Storage or I/O failure, passed through untouched
    #[error("Persistence error: {0:#}")]
    Persistence(#[source] anyhow::Error),
}

impl StatsError {
    pub(crate) fn not_found(subject: SubjectRef, reason: impl Into<String>) -> Self {
        Self::NotFound {
            subject,
            reason: reason.into(),
        }
    }

    /// Whether the caller should treat this as "nothing to report" rather than a failure
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type Result<T, E = StatsError> = std::result::Result<T, E>;
