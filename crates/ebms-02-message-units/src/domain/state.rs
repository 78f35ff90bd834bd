//! # Processing States
//!
//! The processing history of a message unit is an append-only ledger of
//! timed states. The last entry is the current state.
//!
//! There is no fixed transition table: each caller names the state it
//! expects the unit to be in, and the transition guard enforces it.
//!
//! ```text
//! outgoing user message:
//!   SUBMITTED → PROCESSING → READY_TO_PUSH → SENDING → AWAITING_RECEIPT → DONE
//!                          ↘ AWAITING_PULL → PROCESSING (claimed by a Pull Request) → ...
//!
//! incoming user message:
//!   RECEIVED → PROCESSING → READY_FOR_DELIVERY → OUT_FOR_DELIVERY → DELIVERED
//!                         ↘ DUPLICATE                             ↘ DELIVERY_FAILED
//! ```

use crate::error::UnknownStateError;
use serde::{Deserialize, Serialize};
use shared_types::Timestamp;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessingState {
    Submitted,
    Received,
    ReadyToPush,
    AwaitingPull,
    Processing,
    Sending,
    TransportFailure,
    AwaitingReceipt,
    ReadyForDelivery,
    OutForDelivery,
    Delivered,
    DeliveryFailed,
    Duplicate,
    Done,
    Failure,
    ProcWithWarning,
    Created,
}

impl ProcessingState {
    pub const ALL: [ProcessingState; 17] = [
        ProcessingState::Submitted,
        ProcessingState::Received,
        ProcessingState::ReadyToPush,
        ProcessingState::AwaitingPull,
        ProcessingState::Processing,
        ProcessingState::Sending,
        ProcessingState::TransportFailure,
        ProcessingState::AwaitingReceipt,
        ProcessingState::ReadyForDelivery,
        ProcessingState::OutForDelivery,
        ProcessingState::Delivered,
        ProcessingState::DeliveryFailed,
        ProcessingState::Duplicate,
        ProcessingState::Done,
        ProcessingState::Failure,
        ProcessingState::ProcWithWarning,
        ProcessingState::Created,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingState::Submitted => "SUBMITTED",
            ProcessingState::Received => "RECEIVED",
            ProcessingState::ReadyToPush => "READY_TO_PUSH",
            ProcessingState::AwaitingPull => "AWAITING_PULL",
            ProcessingState::Processing => "PROCESSING",
            ProcessingState::Sending => "SENDING",
            ProcessingState::TransportFailure => "TRANSPORT_FAILURE",
            ProcessingState::AwaitingReceipt => "AWAITING_RECEIPT",
            ProcessingState::ReadyForDelivery => "READY_FOR_DELIVERY",
            ProcessingState::OutForDelivery => "OUT_FOR_DELIVERY",
            ProcessingState::Delivered => "DELIVERED",
            ProcessingState::DeliveryFailed => "DELIVERY_FAILED",
            ProcessingState::Duplicate => "DUPLICATE",
            ProcessingState::Done => "DONE",
            ProcessingState::Failure => "FAILURE",
            ProcessingState::ProcWithWarning => "PROC_WITH_WARNING",
            ProcessingState::Created => "CREATED",
        }
    }
}

impl fmt::Display for ProcessingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessingState {
    type Err = UnknownStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        ProcessingState::ALL
            .into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| UnknownStateError(s.to_string()))
    }
}

/// One entry of the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingStateEntry {
    pub state: ProcessingState,
    pub start_time: Timestamp,
    /// Position in the ledger, starting at 0
    pub sequence: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Append-only processing history of a message unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessingStateLedger {
    entries: Vec<ProcessingStateEntry>,
}

impl ProcessingStateLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `state` as the new current state.
    pub fn append(
        &mut self,
        state: ProcessingState,
        start_time: Timestamp,
        description: Option<String>,
    ) -> &ProcessingStateEntry {
        let sequence = self.entries.len() as u32;
        self.entries.push(ProcessingStateEntry {
            state,
            start_time,
            sequence,
            description,
        });
        &self.entries[self.entries.len() - 1]
    }

    pub fn current(&self) -> Option<ProcessingState> {
        self.current_entry().map(|e| e.state)
    }

    pub fn current_entry(&self) -> Option<&ProcessingStateEntry> {
        self.entries.last()
    }

    pub fn entries(&self) -> &[ProcessingStateEntry] {
        &self.entries
    }

    /// How often the unit entered `state`.
    pub fn count(&self, state: ProcessingState) -> usize {
        self.entries.iter().filter(|e| e.state == state).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_names() {
        assert_eq!(ProcessingState::ProcWithWarning.to_string(), "PROC_WITH_WARNING");
        assert_eq!(
            "out_for_delivery".parse::<ProcessingState>(),
            Ok(ProcessingState::OutForDelivery)
        );
        assert!("LOST".parse::<ProcessingState>().is_err());
        for state in ProcessingState::ALL {
            assert_eq!(state.as_str().parse::<ProcessingState>(), Ok(state));
        }
    }

    #[test]
    fn test_serde_uses_state_names() {
        let json = serde_json::to_string(&ProcessingState::ReadyForDelivery).unwrap();
        assert_eq!(json, "\"READY_FOR_DELIVERY\"");
        let failure: ProcessingState = serde_json::from_str("\"FAILURE\"").unwrap();
        assert_eq!(failure, ProcessingState::Failure);
    }

    #[test]
    fn test_ledger_appends_in_sequence() {
        let mut ledger = ProcessingStateLedger::new();
        assert_eq!(ledger.current(), None);

        ledger.append(ProcessingState::Received, 10, None);
        let entry = ledger.append(ProcessingState::Processing, 20, Some("picked up".into()));
        assert_eq!(entry.sequence, 1);

        assert_eq!(ledger.current(), Some(ProcessingState::Processing));
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.entries()[0].start_time, 10);
        assert_eq!(ledger.count(ProcessingState::Received), 1);
    }
}
