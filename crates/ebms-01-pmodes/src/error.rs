//! Error types for the P-Mode subsystem

use crate::domain::validation::ValidationIssue;
use thiserror::Error;

/// Errors raised by a P-Mode store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PModeStoreError {
    /// Another P-Mode already uses this id
    #[error("P-Mode with id '{0}' already exists")]
    DuplicateId(String),

    /// No P-Mode with this id exists
    #[error("P-Mode with id '{0}' not found")]
    NotFound(String),
}

/// Errors raised when managing the active P-Mode set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PModeError {
    /// The P-Mode failed validation; every violated rule is listed
    #[error("P-Mode '{id}' is invalid: {}", format_issues(.issues))]
    Invalid {
        id: String,
        issues: Vec<ValidationIssue>,
    },

    #[error(transparent)]
    Store(#[from] PModeStoreError),
}

impl PModeError {
    /// The validation issues, if this is a validation failure.
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            PModeError::Invalid { issues, .. } => issues,
            PModeError::Store(_) => &[],
        }
    }
}

fn format_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for P-Mode store operations
pub type PModeStoreResult<T> = Result<T, PModeStoreError>;

/// Result type for P-Mode management operations
pub type PModeResult<T> = Result<T, PModeError>;
