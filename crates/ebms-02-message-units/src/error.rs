//! Error types for the message-unit subsystem

use crate::domain::UnitKey;
use thiserror::Error;

/// Errors raised by a message-unit repository.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// The stored unit changed since it was read
    #[error("Version conflict on message unit {key}: expected {expected}, found {actual}")]
    VersionConflict {
        key: UnitKey,
        expected: u64,
        actual: u64,
    },

    /// Another outgoing unit already carries this message id
    #[error("Outgoing message id '{0}' already stored")]
    DuplicateMessageId(String),

    #[error("Message unit {0} not found in repository")]
    NotFound(UnitKey),

    /// The backend can not be reached; the operation may succeed later
    #[error("Repository unavailable: {0}")]
    Unavailable(String),

    #[error("Repository failure: {0}")]
    Backend(String),
}

impl RepositoryError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, RepositoryError::VersionConflict { .. })
    }
}

/// Errors raised by the message-unit manager.
///
/// Concurrent modification is not an error; see `TransitionOutcome`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageUnitError {
    /// An outgoing message unit with this message id already exists
    #[error("Outgoing message unit with message id '{0}' already exists")]
    DuplicateMessageId(String),

    #[error("Message unit {0} not found")]
    NotFound(UnitKey),

    #[error("Persistence failure: {0}")]
    Persistence(#[from] RepositoryError),
}

/// Unknown processing state name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown processing state '{0}'")]
pub struct UnknownStateError(pub String);

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Result type for message-unit operations
pub type MessageUnitResult<T> = Result<T, MessageUnitError>;
