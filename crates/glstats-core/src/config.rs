use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_GITLAB_URI: &str = "https://gitlab.com";
pub const DEFAULT_MONTHS_BACK: u32 = 6;
pub const CONFIG_FILE_NAME: &str = "config.toml";

pub const TOKEN_ENV: &str = "GITLAB_TOKEN";
pub const URI_ENV: &str = "GITLAB_URI";

/// Get the data directory (`$HOME/.gitlab-stats`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn get_data_dir() -> Result<PathBuf> {
    let mut path = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Failed to get home dir"))?;
    path.push(".gitlab-stats");
    Ok(path)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gitlab: GitLabConfig,
    pub chart: ChartConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitLabConfig {
    pub uri: String,
    /// Usually supplied through `GITLAB_TOKEN` instead
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for GitLabConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_GITLAB_URI.to_string(),
            token: None,
        }
    }
}

impl GitLabConfig {
    /// REST API base derived from the instance URI
    #[must_use]
    pub fn api_base(&self) -> String {
        format!("{}/api/v4", self.uri.trim_end_matches('/'))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub months_back: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            months_back: DEFAULT_MONTHS_BACK,
        }
    }
}

impl Config {
    /// Load `config.toml` from `dir` if present, then apply environment overrides
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed
    pub fn load(dir: &Path) -> Result<Self> {
        let mut config = Self::from_file(&dir.join(CONFIG_FILE_NAME))?;
        config.apply_overrides(
            std::env::var(TOKEN_ENV).ok(),
            std::env::var(URI_ENV).ok(),
        );
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Empty values are ignored
    fn apply_overrides(&mut self, token: Option<String>, uri: Option<String>) {
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            self.gitlab.token = Some(token);
        }
        if let Some(uri) = uri.filter(|u| !u.is_empty()) {
            self.gitlab.uri = uri;
        }
    }

    /// # Errors
    ///
    /// Returns an error if no token is configured
    pub fn require_token(&self) -> Result<&str> {
        self.gitlab
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| anyhow::anyhow!("Set {TOKEN_ENV} environment variable"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.gitlab.uri, "https://gitlab.com");
        assert_eq!(config.gitlab.api_base(), "https://gitlab.com/api/v4");
        assert_eq!(config.chart.months_back, 6);
        assert!(config.require_token().is_err());
    }

    #[test]
    fn test_from_file_partial() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[gitlab]\nuri = \"https://git.example.com/\"\n",
        )
        .unwrap();

        let config = Config::from_file(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config.gitlab.api_base(), "https://git.example.com/api/v4");
        assert_eq!(config.chart.months_back, DEFAULT_MONTHS_BACK);
    }

    #[test]
    fn test_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::from_file(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[chart]\nmonths_back = \"many\"\n").unwrap();
        assert!(Config::from_file(&path).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_overrides(Some("glpat-123".to_string()), Some(String::new()));
        assert_eq!(config.require_token().unwrap(), "glpat-123");
        assert_eq!(config.gitlab.uri, DEFAULT_GITLAB_URI);

        config.apply_overrides(None, Some("https://self.hosted".to_string()));
        assert_eq!(config.gitlab.uri, "https://self.hosted");
    }
}
