pub mod db;
pub mod error;
pub mod jsonfile;
pub mod migrations;
pub mod models;
pub mod store;

pub use db::{default_db_path, legacy_json_path, Database};
pub use error::CorruptRecord;
pub use jsonfile::JsonFileStore;
pub use models::{Counts, Snapshot, Subject, SubjectKind, SubjectRef};
pub use store::SnapshotStore;
