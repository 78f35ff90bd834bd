//! Message units and the handles callers keep to them.

use super::state::{ProcessingState, ProcessingStateLedger};
use serde::{Deserialize, Serialize};
use shared_types::{Direction, Timestamp};
use std::fmt;
use uuid::Uuid;

/// Repository identity of a message unit.
///
/// Message ids of received units may repeat, so units are keyed by a
/// surrogate id instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitKey(Uuid);

impl UnitKey {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UnitKey {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UnitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to a persisted message unit at a given version.
///
/// Holding a handle does not lock anything; operations re-read the unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnitRef {
    pub key: UnitKey,
    pub version: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageUnitKind {
    UserMessage,
    PullRequest,
    Receipt,
    Error,
}

impl MessageUnitKind {
    pub fn is_signal(&self) -> bool {
        !matches!(self, MessageUnitKind::UserMessage)
    }

    /// State of a unit this engine creates for sending.
    pub fn initial_outgoing_state(&self) -> ProcessingState {
        if self.is_signal() {
            ProcessingState::Created
        } else {
            ProcessingState::Submitted
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageUnit {
    pub key: UnitKey,
    /// Persisted version; 0 until the unit is first stored
    pub version: u64,
    pub kind: MessageUnitKind,
    pub direction: Direction,
    pub message_id: String,
    #[serde(default)]
    pub ref_to_message_id: Option<String>,
    pub timestamp: Timestamp,
    /// Id of the governing P-Mode
    #[serde(default)]
    pub pmode_id: Option<String>,
    #[serde(default)]
    pub mpc: Option<String>,
    pub states: ProcessingStateLedger,
}

impl MessageUnit {
    pub fn current_state(&self) -> Option<ProcessingState> {
        self.states.current()
    }

    pub fn unit_ref(&self) -> UnitRef {
        UnitRef {
            key: self.key,
            version: self.version,
        }
    }
}

/// Data for a message unit that is about to be stored.
///
/// Message id and timestamp are generated on storage when absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessageUnit {
    pub kind: MessageUnitKind,
    pub message_id: Option<String>,
    pub ref_to_message_id: Option<String>,
    pub timestamp: Option<Timestamp>,
    pub pmode_id: Option<String>,
    pub mpc: Option<String>,
}

impl NewMessageUnit {
    pub fn new(kind: MessageUnitKind) -> Self {
        Self {
            kind,
            message_id: None,
            ref_to_message_id: None,
            timestamp: None,
            pmode_id: None,
            mpc: None,
        }
    }

    pub fn user_message() -> Self {
        Self::new(MessageUnitKind::UserMessage)
    }

    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }

    pub fn with_ref_to_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.ref_to_message_id = Some(message_id.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_pmode_id(mut self, pmode_id: impl Into<String>) -> Self {
        self.pmode_id = Some(pmode_id.into());
        self
    }

    pub fn with_mpc(mut self, mpc: impl Into<String>) -> Self {
        self.mpc = Some(mpc.into());
        self
    }
}
