/// A stored record that cannot be turned back into a snapshot
#[derive(Debug, thiserror::Error)]
#[error("Corrupted {what}: {message}")]
pub struct CorruptRecord {
    pub what: &'static str,
    pub message: String,
}
