// src/storage/errors.rs
use thiserror::Error;

use crate::utils::error::AttendanceError;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Key already exists: {0}")]
    DuplicateKey(String),

    /// The latest stored event is not the one the writer based its decision on.
    #[error("Latest event for identity {identity_id} changed concurrently")]
    Conflict { identity_id: String },
}

pub type Result<T> = std::result::Result<T, StorageError>;

impl From<StorageError> for AttendanceError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::Conflict { identity_id } => AttendanceError::SequenceConflict(identity_id),
            StorageError::DuplicateKey(key) => AttendanceError::DuplicateEnrollment(key),
            other => AttendanceError::StoreUnavailable(other.to_string()),
        }
    }
}
