pub mod error;
pub mod gitlab;
pub mod http;
pub mod traits;

pub use error::GitLabError;
pub use gitlab::{GitLabClient, GitLabProject, IssueStatistics};
pub use traits::StatisticsSource;
