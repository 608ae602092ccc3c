use async_trait::async_trait;
use glstats_storage::{Counts, SubjectRef};

use crate::error::GitLabError;

/// Anything that can report the current issue counters of a project or group
#[async_trait]
pub trait StatisticsSource: Send + Sync {
    /// Fetch the counters as they are right now
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the answer cannot be decoded
    async fn fetch_counts(&self, subject: SubjectRef) -> Result<Counts, GitLabError>;

    /// Get the source name
    #[must_use]
    fn source_name(&self) -> &'static str;
}
