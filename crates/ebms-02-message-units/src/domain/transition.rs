//! Outcome of a guarded state transition.

use super::state::ProcessingState;
use super::unit::UnitRef;

/// What became of a requested state transition.
///
/// Only `Applied` changed the unit. The other outcomes are normal results of
/// concurrent processing and leave the unit as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The new state was appended; the handle points at the new version
    Applied(UnitRef),
    /// The unit was not in the required state
    StateMismatch { current: Option<ProcessingState> },
    /// Another writer changed the unit first
    Conflict,
}

impl TransitionOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, TransitionOutcome::Applied(_))
    }

    pub fn applied_ref(&self) -> Option<UnitRef> {
        match self {
            TransitionOutcome::Applied(unit) => Some(*unit),
            _ => None,
        }
    }
}
