//! Error types for titanhelp

use thiserror::Error;

/// A caller-supplied value broke a field rule.
///
/// Always recoverable. Front ends report the message verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Name is required")]
    NameRequired,

    #[error("Name must be ≤ {max} characters")]
    NameTooLong { max: usize, len: usize },

    #[error("Problem Description is required")]
    DescriptionRequired,

    #[error("Problem Description must be ≤ {max} characters")]
    DescriptionTooLong { max: usize, len: usize },

    #[error("Status must be one of Open, In Progress, Closed (got '{0}')")]
    InvalidStatus(String),

    #[error("Priority must be one of Low, Medium, High (got '{0}')")]
    InvalidPriority(String),

    #[error("Sort must be one of created_at, id, name, status, priority with optional asc/desc (got '{0}')")]
    InvalidSort(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Config(String),
}

impl Error {
    /// True when the caller can fix the request and retry
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}
