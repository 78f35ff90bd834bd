//! Domain layer for the message-unit subsystem.

pub mod state;
pub mod transition;
pub mod unit;

pub use state::{ProcessingState, ProcessingStateEntry, ProcessingStateLedger};
pub use transition::TransitionOutcome;
pub use unit::{MessageUnit, MessageUnitKind, NewMessageUnit, UnitKey, UnitRef};
