use thiserror::Error;

/// Errors that can occur when reading from or committing to a row source.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A write targeted a row that no longer exists (stale write).
    #[error("Concurrency conflict: {entity} {id} was modified or removed")]
    ConcurrencyConflict { entity: &'static str, id: String },

    /// A commit would leave a row pointing at a missing parent.
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// A commit tried to insert a row whose key is already taken.
    #[error("Duplicate key: {entity} {id}")]
    DuplicateKey { entity: &'static str, id: String },

    /// The change set was empty.
    #[error("Cannot commit an empty change set")]
    EmptyChangeSet,

    /// The backing store could not be reached or refused the commit.
    #[error("Row source unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Returns true for stale-write errors that callers should re-check.
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(self, StoreError::ConcurrencyConflict { .. })
    }
}

/// Result type for row source operations.
pub type Result<T> = std::result::Result<T, StoreError>;
