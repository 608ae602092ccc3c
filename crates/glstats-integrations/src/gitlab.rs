//! GitLab REST client
//!
//! Reads issue statistics of projects and groups, and searches projects so a
//! local clone can be mapped back to its GitLab project id.
//! Works with GitLab.com and self-hosted instances.

use async_trait::async_trait;
use glstats_storage::{Counts, SubjectKind, SubjectRef};
use reqwest::{header, Client};
use serde::Deserialize;

use crate::error::GitLabError;
use crate::http::ResponseExt;
use crate::traits::StatisticsSource;

pub const DEFAULT_API_BASE: &str = "https://gitlab.com/api/v4";

const API_NAME: &str = "GitLab";

/// GitLab API client for issue statistics
pub struct GitLabClient {
    client: Client,
    /// API base URL
    api_base: String,
}

/// `GET /projects/:id/issues_statistics` response.
///
/// Decoded strictly: any field GitLab adds is treated as a decode failure.
/// Missing counters read as 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IssueStatistics {
    statistics: StatisticsBody,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct StatisticsBody {
    counts: IssueCounts,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct IssueCounts {
    all: i64,
    closed: i64,
    opened: i64,
}

impl IssueStatistics {
    /// Counters in storage form (`all` becomes `total`)
    #[must_use]
    pub fn counts(&self) -> Counts {
        let c = self.statistics.counts;
        Counts::new(c.opened, c.closed, c.all)
    }
}

/// Project entry of `GET /search?scope=projects`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GitLabProject {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub ssh_url_to_repo: String,
    #[serde(default)]
    pub http_url_to_repo: String,
}

impl GitLabProject {
    /// Whether `remote` is one of this project's clone URLs
    #[must_use]
    pub fn matches_remote(&self, remote: &str) -> bool {
        !remote.is_empty() && (self.ssh_url_to_repo == remote || self.http_url_to_repo == remote)
    }
}

/// Decode an issue statistics payload
///
/// # Errors
///
/// Returns `GitLabError::Decode` on malformed JSON or unknown fields
pub fn parse_statistics(body: &str) -> Result<IssueStatistics, GitLabError> {
    serde_json::from_str(body).map_err(|e| GitLabError::decode("issue statistics", &e))
}

/// Decode a project search payload
///
/// # Errors
///
/// Returns `GitLabError::Decode` if the payload is not a list of projects
pub fn parse_projects(body: &str) -> Result<Vec<GitLabProject>, GitLabError> {
    serde_json::from_str(body).map_err(|e| GitLabError::decode("project search results", &e))
}

/// First project whose SSH or HTTP clone URL equals `remote`
#[must_use]
pub fn find_project<'a>(projects: &'a [GitLabProject], remote: &str) -> Option<&'a GitLabProject> {
    projects.iter().find(|p| {
        log::debug!(
            "Candidate project {} ({}): {} / {}",
            p.name,
            p.id,
            p.ssh_url_to_repo,
            p.http_url_to_repo
        );
        p.matches_remote(remote)
    })
}

impl GitLabClient {
    /// Create a new GitLab client for gitlab.com
    ///
    /// # Errors
    /// Returns an error if the token is not a valid header value or the HTTP client cannot be created
    pub fn new(token: &str) -> Result<Self, GitLabError> {
        Self::with_base_url(token, DEFAULT_API_BASE)
    }

    /// Create a new GitLab client with custom API base URL (for self-hosted)
    ///
    /// # Arguments
    /// * `token` - GitLab Personal Access Token
    /// * `api_base` - API base URL (e.g., "<https://gitlab.example.com/api/v4>")
    ///
    /// # Errors
    /// Returns an error if the token is not a valid header value or the HTTP client cannot be created
    pub fn with_base_url(token: &str, api_base: &str) -> Result<Self, GitLabError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            "PRIVATE-TOKEN",
            header::HeaderValue::from_str(token).map_err(GitLabError::InvalidToken)?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static("gitlab-stats"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(GitLabError::Client)?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    /// Issue statistics endpoint of a project or group
    #[must_use]
    pub fn statistics_url(&self, subject: SubjectRef) -> String {
        let collection = match subject.kind {
            SubjectKind::Project => "projects",
            SubjectKind::Group => "groups",
        };
        format!("{}/{collection}/{}/issues_statistics", self.api_base, subject.id)
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.api_base)
    }

    async fn get_text(
        &self,
        request: reqwest::RequestBuilder,
        url: String,
    ) -> Result<String, GitLabError> {
        request
            .send()
            .await
            .map_err(|source| GitLabError::Request { url, source })?
            .ensure_success(API_NAME)
            .await?
            .body_text()
            .await
    }

    /// Current issue counters of a project or group
    ///
    /// # Errors
    /// Returns an error if the API request fails or the payload cannot be decoded
    pub async fn issues_statistics(
        &self,
        subject: SubjectRef,
    ) -> Result<IssueStatistics, GitLabError> {
        let url = self.statistics_url(subject);
        log::debug!("Fetching issue statistics of {subject} from {url}");

        let body = self.get_text(self.client.get(&url), url.clone()).await?;
        parse_statistics(&body)
    }

    /// Search projects by name
    ///
    /// # Errors
    /// Returns an error if the API request fails or the payload cannot be decoded
    pub async fn search_projects(&self, name: &str) -> Result<Vec<GitLabProject>, GitLabError> {
        let url = self.search_url();
        let request = self
            .client
            .get(&url)
            .query(&[("scope", "projects"), ("search", name)]);

        let body = self.get_text(request, url).await?;
        parse_projects(&body)
    }

    /// Search projects named `name` and keep the one cloned from `remote`
    ///
    /// # Errors
    /// Returns `GitLabError::ProjectNotFound` if no search result has `remote` as clone URL
    pub async fn find_project_by_remote(
        &self,
        name: &str,
        remote: &str,
    ) -> Result<GitLabProject, GitLabError> {
        log::info!("Looking up project {name} on {}", self.api_base);
        let projects = self.search_projects(name).await?;
        find_project(&projects, remote)
            .cloned()
            .ok_or_else(|| GitLabError::ProjectNotFound {
                remote: remote.to_string(),
            })
    }
}

#[async_trait]
impl StatisticsSource for GitLabClient {
    async fn fetch_counts(&self, subject: SubjectRef) -> Result<Counts, GitLabError> {
        Ok(self.issues_statistics(subject).await?.counts())
    }

    fn source_name(&self) -> &'static str {
        API_NAME
    }
}
