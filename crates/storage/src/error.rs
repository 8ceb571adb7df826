//! Storage error types

/// Storage error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Existence record's type tag disagrees with the requested operation
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,
    /// Invalid argument (non-numeric value, arithmetic overflow, ...)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Storage I/O fault, fatal to the operation
    #[error("storage io: {0}")]
    Io(String),
}

impl From<rocksdb::Error> for StoreError {
    fn from(e: rocksdb::Error) -> Self {
        StoreError::Io(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
