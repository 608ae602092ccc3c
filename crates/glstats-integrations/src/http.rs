//! HTTP utilities for API integrations.

use crate::error::GitLabError;

/// Extension trait for `reqwest::Response` to handle common error patterns.
#[async_trait::async_trait]
pub trait ResponseExt {
    /// Ensure the response status is successful, returning an error with details if not.
    ///
    /// # Errors
    ///
    /// Returns `GitLabError::Api` if the response status is not successful (2xx),
    /// carrying the status code and response body.
    async fn ensure_success(self, api: &'static str) -> Result<Self, GitLabError>
    where
        Self: Sized;

    /// Read the whole body as text
    ///
    /// # Errors
    ///
    /// Returns `GitLabError::Request` if the body cannot be read
    async fn body_text(self) -> Result<String, GitLabError>
    where
        Self: Sized;
}

#[async_trait::async_trait]
impl ResponseExt for reqwest::Response {
    async fn ensure_success(self, api: &'static str) -> Result<Self, GitLabError> {
        if !self.status().is_success() {
            let status = self.status();
            let body = self.text().await.unwrap_or_default();
            return Err(GitLabError::Api { api, status, body });
        }
        Ok(self)
    }

    async fn body_text(self) -> Result<String, GitLabError> {
        let url = self.url().to_string();
        self.text()
            .await
            .map_err(|source| GitLabError::Request { url, source })
    }
}
