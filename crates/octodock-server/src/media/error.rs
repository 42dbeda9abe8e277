use octodock_core::db::DatabaseError;

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    /// Missing, empty, or unreadable upload content.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Media with id {0} not found")]
    NotFound(String),

    /// Filesystem or catalog failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<DatabaseError> for MediaError {
    fn from(e: DatabaseError) -> Self {
        Self::Storage(e.to_string())
    }
}
