//! # Error Types
//!
//! Errors raised when textual values of shared entities cannot be parsed.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Unknown direction: {0}")]
    UnknownDirection(String),

    #[error("Unknown evidence scope: {0}")]
    UnknownEvidenceScope(String),
}
