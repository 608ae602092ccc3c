//! Helper utility functions for CLI commands

use anyhow::{Context, Result};
use glstats_core::Config;
use glstats_detector::GitDetector;
use glstats_integrations::GitLabClient;
use glstats_storage::{legacy_json_path, Database, JsonFileStore, SnapshotStore, SubjectRef};
use std::path::Path;

use super::{AppContext, SubjectArgs};

/// Backend selected on the command line
pub enum Store {
    Sqlite(Database),
    Json(JsonFileStore),
}

impl Store {
    pub fn as_store(&self) -> &dyn SnapshotStore {
        match self {
            Self::Sqlite(db) => db,
            Self::Json(file) => file,
        }
    }

    pub fn database(&self) -> Option<&Database> {
        match self {
            Self::Sqlite(db) => Some(db),
            Self::Json(_) => None,
        }
    }
}

pub fn open_store(ctx: &AppContext) -> Result<Store> {
    match &ctx.json_store {
        Some(path) => {
            log::info!("Using JSON snapshot store {}", path.display());
            Ok(Store::Json(JsonFileStore::new(path.clone())))
        }
        None => open_database(&ctx.db_path).map(Store::Sqlite),
    }
}

/// Open the SQLite database; while it holds no subject it is seeded from a sibling `db.json`.
pub fn open_database(path: &Path) -> Result<Database> {
    let db = Database::new(Some(path.to_path_buf()))?;

    if db.get_all_subjects()?.is_empty() {
        let legacy = legacy_json_path(path);
        if legacy.is_file() {
            let imported = db.import_legacy_json(&legacy)?;
            log::info!(
                "Imported {imported} snapshots from legacy database {}",
                legacy.display()
            );
        }
    }
    Ok(db)
}

pub fn gitlab_client(config: &Config) -> Result<GitLabClient> {
    let token = config.require_token()?;
    Ok(GitLabClient::with_base_url(token, &config.gitlab.api_base())?)
}

/// Subject given on the command line, with a display name when it was looked up
pub struct Resolved {
    pub subject: SubjectRef,
    pub name: Option<String>,
}

/// Use `-p`/`-g` if given, otherwise map the enclosing git clone to its GitLab project
pub async fn resolve_subject(ctx: &AppContext, args: SubjectArgs) -> Result<Resolved> {
    if let Some(subject) = args.subject() {
        return Ok(Resolved {
            subject,
            name: None,
        });
    }

    let cwd = std::env::current_dir().context("Failed to get working directory")?;
    let origin = GitDetector::new()
        .detect_origin(&cwd)
        .context("No -p/-g given and no GitLab clone found")?;

    let client = gitlab_client(&ctx.config)?;
    let project = client
        .find_project_by_remote(&origin.project_name, &origin.url)
        .await?;
    log::info!("Project {} resolved to id {}", project.name, project.id);

    Ok(Resolved {
        subject: SubjectRef::project(project.id),
        name: Some(project.name),
    })
}
