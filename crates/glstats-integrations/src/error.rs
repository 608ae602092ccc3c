//! Failures talking to the GitLab REST API.

use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum GitLabError {
    #[error("Invalid token format: {0}")]
    InvalidToken(#[source] reqwest::header::InvalidHeaderValue),

    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-2xx answer, with whatever body the server sent back
    #[error("{api} API error ({status}): {body}")]
    Api {
        api: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("Failed to decode {what}: {message}")]
    Decode { what: &'static str, message: String },

    #[error("No project found matching remote {remote}")]
    ProjectNotFound { remote: String },
}

impl GitLabError {
    pub(crate) fn decode(what: &'static str, err: &serde_json::Error) -> Self {
        Self::Decode {
            what,
            message: err.to_string(),
        }
    }
}
