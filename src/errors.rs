use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage is unavailable: {0}")]
    Unavailable(String),

    #[error("Storage quota exceeded writing '{key}': {needed} bytes needed, limit is {limit}")]
    QuotaExceeded {
        key: String,
        needed: usize,
        limit: usize,
    },

    #[error("Failed to access storage medium: {0}")]
    Io(String),

    #[error("Failed to serialize stored value: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for StorageError {
    fn from(error: std::io::Error) -> Self {
        StorageError::Io(error.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(error: serde_json::Error) -> Self {
        StorageError::Serialization(error.to_string())
    }
}

/// Failures surfaced by the save/load/rename/delete workflows.
///
/// The repository itself never fails; these describe what the caller asked
/// for, not what the store did.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemeError {
    #[error("No saved scheme with id '{0}'")]
    NotFound(String),

    #[error("Scheme name must not be empty")]
    EmptyName,

    #[error("Action cancelled by user")]
    Cancelled,
}
