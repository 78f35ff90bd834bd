//! Driven Ports (SPI - Outbound Dependencies)
//!
//! The durable store is not part of the core. Any backend that offers
//! transactions and a version check on save can implement these traits.

use crate::domain::{MessageUnit, MessageUnitKind, ProcessingState, UnitKey, UnitRef};
use crate::error::RepositoryResult;
use shared_types::Direction;

/// Transactional store of message units.
pub trait MessageUnitRepository: Send + Sync {
    /// Starts a transaction.
    ///
    /// # Errors
    /// `RepositoryError::Unavailable` when the backend can not be reached.
    fn begin(&self) -> RepositoryResult<Box<dyn RepositoryTransaction + '_>>;
}

/// Unit of work on the repository.
///
/// Writes become visible to other transactions only on `commit`. Dropping a
/// transaction without committing discards its writes.
pub trait RepositoryTransaction {
    /// The freshest copy of a unit, including writes of this transaction.
    fn load(&mut self, key: UnitKey) -> RepositoryResult<Option<MessageUnit>>;

    /// Units matching `filter`, oldest first.
    fn find(&mut self, filter: &UnitFilter) -> RepositoryResult<Vec<MessageUnit>>;

    /// Stores a new unit at version 1.
    fn insert(&mut self, unit: MessageUnit) -> RepositoryResult<UnitRef>;

    /// Stores a modified unit if the stored version is still
    /// `expected_version`.
    ///
    /// # Errors
    /// `RepositoryError::VersionConflict` when another writer got there
    /// first, now or at commit.
    fn save(&mut self, unit: MessageUnit, expected_version: u64) -> RepositoryResult<UnitRef>;

    fn commit(self: Box<Self>) -> RepositoryResult<()>;

    fn rollback(self: Box<Self>);
}

/// Selection criteria for `RepositoryTransaction::find`.
///
/// Unset criteria match every unit; list criteria match any of their values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitFilter {
    pub direction: Option<Direction>,
    pub kind: Option<MessageUnitKind>,
    pub message_id: Option<String>,
    pub ref_to_message_id: Option<String>,
    pub states: Vec<ProcessingState>,
    pub pmode_ids: Vec<String>,
}

impl UnitFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn kind(mut self, kind: MessageUnitKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }

    pub fn ref_to_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.ref_to_message_id = Some(message_id.into());
        self
    }

    pub fn states(mut self, states: &[ProcessingState]) -> Self {
        self.states = states.to_vec();
        self
    }

    pub fn pmode_ids(mut self, pmode_ids: &[String]) -> Self {
        self.pmode_ids = pmode_ids.to_vec();
        self
    }

    /// True if `unit` satisfies every criterion. The state criterion is
    /// checked against the current state.
    pub fn matches(&self, unit: &MessageUnit) -> bool {
        self.direction.map_or(true, |d| unit.direction == d)
            && self.kind.map_or(true, |k| unit.kind == k)
            && self
                .message_id
                .as_ref()
                .map_or(true, |id| &unit.message_id == id)
            && self
                .ref_to_message_id
                .as_ref()
                .map_or(true, |id| unit.ref_to_message_id.as_ref() == Some(id))
            && (self.states.is_empty()
                || unit
                    .current_state()
                    .is_some_and(|s| self.states.contains(&s)))
            && (self.pmode_ids.is_empty()
                || unit
                    .pmode_id
                    .as_ref()
                    .is_some_and(|id| self.pmode_ids.contains(id)))
    }
}
