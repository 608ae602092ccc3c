pub mod collect;
pub mod graph;
pub mod helpers;
pub mod import;
pub mod seed;
pub mod show;

use chrono::FixedOffset;
use clap::Args;
use glstats_core::Config;
use glstats_storage::SubjectRef;
use std::path::PathBuf;

/// Settings shared by every command
pub struct AppContext {
    pub db_path: PathBuf,
    pub json_store: Option<PathBuf>,
    /// Month boundaries are computed in this offset
    pub offset: FixedOffset,
    pub config: Config,
}

impl AppContext {
    pub fn months_back(&self, months: Option<u32>) -> u32 {
        months.unwrap_or(self.config.chart.months_back)
    }
}

/// `-p ID` or `-g ID`; neither means "the project of the current git clone"
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct SubjectArgs {
    /// GitLab project ID
    #[arg(short = 'p', long = "project", conflicts_with = "group")]
    pub project: Option<i64>,

    /// GitLab group ID
    #[arg(short = 'g', long = "group")]
    pub group: Option<i64>,
}

impl SubjectArgs {
    pub fn subject(self) -> Option<SubjectRef> {
        match (self.project, self.group) {
            (Some(id), _) => Some(SubjectRef::project(id)),
            (None, Some(id)) => Some(SubjectRef::group(id)),
            (None, None) => None,
        }
    }
}
