pub mod git;

pub use git::{project_name_from_remote, GitDetector, RemoteOrigin};
