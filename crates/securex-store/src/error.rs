use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// No home directory to place the default database in.
    #[error("No data directory available for the database")]
    NoDataDir,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Schema migration failed: {0}")]
    Migration(String),

    /// A value could not be encoded to JSON before writing.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored blob is not valid base64.
    #[error("Blob decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The file exceeds the configured per-file quota.
    #[error("File size {size} bytes exceeds limit of {max} bytes")]
    FileTooLarge { size: u64, max: u64 },

    /// The store already holds the configured maximum number of documents.
    #[error("Document limit reached ({max} documents max)")]
    DocumentLimit { max: usize },

    /// No blob stored under the requested content hash.
    #[error("Blob not found")]
    NotFound,

    /// Another thread panicked while holding the store lock.
    #[error("Store lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    pub fn is_quota(&self) -> bool {
        matches!(
            self,
            StoreError::FileTooLarge { .. } | StoreError::DocumentLimit { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
