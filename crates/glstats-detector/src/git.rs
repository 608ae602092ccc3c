use anyhow::{Context, Result};
use git2::{ErrorCode, Repository};
use std::path::{Path, PathBuf};

const ORIGIN: &str = "origin";

/// `origin` remote of the repository enclosing a working directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteOrigin {
    pub repo_path: PathBuf,
    pub url: String,
    /// Repository name as GitLab knows it, used as search term
    pub project_name: String,
}

/// Git repository detector for mapping a clone back to its remote
#[derive(Debug, Default, Clone, Copy)]
pub struct GitDetector;

impl GitDetector {
    /// Create a new Git detector
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Find the Git repository containing the given path
    ///
    /// Searches upward from the given directory
    ///
    /// # Errors
    ///
    /// Returns an error if the path is invalid or no repository is found
    pub fn find_repo(&self, start_path: &Path) -> Result<Option<PathBuf>> {
        let mut current = start_path.to_path_buf();

        loop {
            log::debug!("Looking for .git in {}", current.display());
            if current.join(".git").is_dir() {
                return Ok(Some(current));
            }

            if !current.pop() {
                // Reached root without finding .git
                return Ok(None);
            }
        }
    }

    /// URL of the remote called `name`, if configured
    ///
    /// # Errors
    ///
    /// Returns an error if the repository cannot be opened or the remote cannot be read.
    /// A remote that does not exist is `None`.
    pub fn remote_url(&self, repo_path: &Path, name: &str) -> Result<Option<String>> {
        let repo = Repository::open(repo_path)
            .with_context(|| format!("Failed to open Git repository at {}", repo_path.display()))?;

        let remote = match repo.find_remote(name) {
            Ok(remote) => remote,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read remote {name} of {}", repo_path.display())
                })
            }
        };
        let url = remote.url().map(String::from);
        log::debug!("Remote {name} of {}: {url:?}", repo_path.display());
        Ok(url)
    }

    /// Locate the enclosing repository and read its `origin` remote
    ///
    /// # Errors
    ///
    /// Returns an error if no repository encloses `working_dir`, it has no
    /// `origin` remote, or the remote URL yields no project name
    pub fn detect_origin(&self, working_dir: &Path) -> Result<RemoteOrigin> {
        let repo_path = self
            .find_repo(working_dir)?
            .with_context(|| format!(".git not found above {}", working_dir.display()))?;

        let url = self
            .remote_url(&repo_path, ORIGIN)?
            .with_context(|| format!("No {ORIGIN} remote in {}", repo_path.display()))?;

        let project_name = project_name_from_remote(&url)
            .with_context(|| format!("Cannot derive a project name from {url}"))?;

        Ok(RemoteOrigin {
            repo_path,
            url,
            project_name,
        })
    }
}

/// Last path segment of a clone URL, without the `.git` suffix.
///
/// Handles both `https://host/group/name.git` and `git@host:group/name.git`.
#[must_use]
pub fn project_name_from_remote(url: &str) -> Option<String> {
    let trimmed = url.trim().trim_end_matches('/');
    let last = trimmed.rsplit(|c: char| c == '/' || c == ':').next()?;
    let name = last.strip_suffix(".git").unwrap_or(last);
    (!name.is_empty()).then(|| name.to_string())
}
