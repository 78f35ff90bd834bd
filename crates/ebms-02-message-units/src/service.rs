//! Message-Unit Service
//!
//! Stores message units and moves them through their processing states.
//!
//! ## Transition Guard
//!
//! ```text
//! begin → load freshest copy → [required state?] → append state → save(expected version) → commit
//!                                     │                                    │
//!                                     └─ mismatch: StateMismatch           └─ version changed: Conflict
//! ```
//!
//! Any other repository failure rolls back and is reported as
//! `MessageUnitError::Persistence`. Nothing is retried here.

use crate::domain::{
    MessageUnit, MessageUnitKind, NewMessageUnit, ProcessingState, ProcessingStateLedger,
    TransitionOutcome, UnitKey, UnitRef,
};
use crate::error::{MessageUnitError, MessageUnitResult, RepositoryError, RepositoryResult};
use crate::ports::inbound::MessageUnitApi;
use crate::ports::outbound::{MessageUnitRepository, RepositoryTransaction, UnitFilter};
use shared_types::{Direction, TimeSource};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct MessageUnitManager {
    repository: Arc<dyn MessageUnitRepository>,
    time_source: Arc<dyn TimeSource>,
    /// Right-hand side of generated message ids
    host_id: String,
}

impl MessageUnitManager {
    pub fn new(
        repository: Arc<dyn MessageUnitRepository>,
        time_source: Arc<dyn TimeSource>,
        host_id: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            time_source,
            host_id: host_id.into(),
        }
    }

    /// A new globally unique message id, `<uuid>@<host id>`.
    pub fn generate_message_id(&self) -> String {
        format!("{}@{}", Uuid::new_v4(), self.host_id)
    }

    fn build(&self, draft: NewMessageUnit, direction: Direction, state: ProcessingState) -> MessageUnit {
        let now = self.time_source.now();
        let mut states = ProcessingStateLedger::new();
        states.append(state, now, None);
        MessageUnit {
            key: UnitKey::new(),
            version: 0,
            kind: draft.kind,
            direction,
            message_id: draft
                .message_id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| self.generate_message_id()),
            ref_to_message_id: draft.ref_to_message_id,
            timestamp: draft.timestamp.unwrap_or(now),
            pmode_id: draft.pmode_id,
            mpc: draft.mpc,
            states,
        }
    }

    fn insert(&self, mut unit: MessageUnit, check_duplicate: bool) -> MessageUnitResult<MessageUnit> {
        let mut tx = self.repository.begin()?;

        if check_duplicate {
            let filter = UnitFilter::new()
                .direction(Direction::Out)
                .message_id(unit.message_id.clone());
            match tx.find(&filter) {
                Ok(existing) if !existing.is_empty() => {
                    tx.rollback();
                    warn!(message_id = %unit.message_id, "Rejected duplicate outgoing message id");
                    return Err(MessageUnitError::DuplicateMessageId(unit.message_id));
                }
                Ok(_) => {}
                Err(e) => return Err(self.abort(tx, e)),
            }
        }

        let unit_ref = match tx.insert(unit.clone()) {
            Ok(unit_ref) => unit_ref,
            Err(e) => return Err(self.abort(tx, e)),
        };
        match tx.commit() {
            Ok(()) => {}
            Err(RepositoryError::DuplicateMessageId(message_id)) => {
                warn!(%message_id, "Rejected duplicate outgoing message id at commit");
                return Err(MessageUnitError::DuplicateMessageId(message_id));
            }
            Err(e) => {
                warn!(key = %unit.key, error = %e, "Failed to store message unit");
                return Err(MessageUnitError::Persistence(e));
            }
        }

        unit.version = unit_ref.version;
        info!(
            key = %unit.key,
            message_id = %unit.message_id,
            direction = %unit.direction,
            state = ?unit.current_state(),
            "Stored message unit"
        );
        Ok(unit)
    }

    /// Runs a read-only query in its own transaction.
    fn read<T>(
        &self,
        query: impl FnOnce(&mut dyn RepositoryTransaction) -> RepositoryResult<T>,
    ) -> MessageUnitResult<T> {
        let mut tx = self.repository.begin()?;
        let result = query(tx.as_mut());
        tx.rollback();
        Ok(result?)
    }

    fn find(&self, filter: UnitFilter) -> MessageUnitResult<Vec<MessageUnit>> {
        self.read(|tx| tx.find(&filter))
    }

    fn abort(&self, tx: Box<dyn RepositoryTransaction + '_>, error: RepositoryError) -> MessageUnitError {
        tx.rollback();
        warn!(%error, "Message unit transaction rolled back");
        MessageUnitError::Persistence(error)
    }

    /// Maps a failed save or commit: a version conflict is a lost race.
    fn conflict_or_error(&self, key: UnitKey, error: RepositoryError) -> MessageUnitResult<TransitionOutcome> {
        if error.is_conflict() {
            debug!(%key, %error, "Message unit modified concurrently");
            return Ok(TransitionOutcome::Conflict);
        }
        warn!(%key, %error, "Failed to persist message unit");
        Err(MessageUnitError::Persistence(error))
    }
}

impl MessageUnitApi for MessageUnitManager {
    fn store_outgoing(&self, draft: NewMessageUnit) -> MessageUnitResult<MessageUnit> {
        let state = draft.kind.initial_outgoing_state();
        let unit = self.build(draft, Direction::Out, state);
        self.insert(unit, true)
    }

    fn store_incoming(&self, draft: NewMessageUnit) -> MessageUnitResult<MessageUnit> {
        let unit = self.build(draft, Direction::In, ProcessingState::Received);
        self.insert(unit, false)
    }

    fn get(&self, key: UnitKey) -> MessageUnitResult<Option<MessageUnit>> {
        self.read(|tx| tx.load(key))
    }

    fn find_by_message_id(&self, message_id: &str) -> MessageUnitResult<Vec<MessageUnit>> {
        self.find(UnitFilter::new().message_id(message_id))
    }

    fn find_by_ref_to_message_id(&self, message_id: &str) -> MessageUnitResult<Vec<MessageUnit>> {
        self.find(UnitFilter::new().ref_to_message_id(message_id))
    }

    fn find_in_state(
        &self,
        direction: Direction,
        states: &[ProcessingState],
    ) -> MessageUnitResult<Vec<MessageUnit>> {
        self.find(UnitFilter::new().direction(direction).states(states))
    }

    fn find_for_pmodes_in_state(
        &self,
        pmode_ids: &[String],
        state: ProcessingState,
    ) -> MessageUnitResult<Vec<MessageUnit>> {
        if pmode_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.find(UnitFilter::new().pmode_ids(pmode_ids).states(&[state]))
    }

    fn set_pmode_id(&self, unit: &UnitRef, pmode_id: Option<String>) -> MessageUnitResult<bool> {
        let mut tx = self.repository.begin()?;
        let mut fresh = match tx.load(unit.key) {
            Ok(Some(fresh)) => fresh,
            Ok(None) => {
                tx.rollback();
                return Err(MessageUnitError::NotFound(unit.key));
            }
            Err(e) => return Err(self.abort(tx, e)),
        };

        let expected = fresh.version;
        fresh.pmode_id = pmode_id;
        if let Err(e) = tx.save(fresh, expected) {
            tx.rollback();
            return self.conflict_or_error(unit.key, e).map(|o| o.is_applied());
        }
        match tx.commit() {
            Ok(()) => Ok(true),
            Err(e) => self.conflict_or_error(unit.key, e).map(|o| o.is_applied()),
        }
    }

    fn set_processing_state(
        &self,
        unit: &UnitRef,
        new_state: ProcessingState,
        required: Option<ProcessingState>,
        description: Option<String>,
    ) -> MessageUnitResult<TransitionOutcome> {
        let mut tx = self.repository.begin()?;
        let mut fresh = match tx.load(unit.key) {
            Ok(Some(fresh)) => fresh,
            Ok(None) => {
                tx.rollback();
                return Err(MessageUnitError::NotFound(unit.key));
            }
            Err(e) => return Err(self.abort(tx, e)),
        };

        let current = fresh.current_state();
        if let Some(required) = required {
            if current != Some(required) {
                tx.rollback();
                debug!(
                    key = %unit.key,
                    ?current,
                    %required,
                    %new_state,
                    "Transition skipped, unit not in required state"
                );
                return Ok(TransitionOutcome::StateMismatch { current });
            }
        }

        let expected = fresh.version;
        fresh
            .states
            .append(new_state, self.time_source.now(), description);

        let unit_ref = match tx.save(fresh, expected) {
            Ok(unit_ref) => unit_ref,
            Err(e) => {
                tx.rollback();
                return self.conflict_or_error(unit.key, e);
            }
        };
        if let Err(e) = tx.commit() {
            return self.conflict_or_error(unit.key, e);
        }

        debug!(
            key = %unit.key,
            from = ?current,
            to = %new_state,
            version = unit_ref.version,
            "Processing state changed"
        );
        Ok(TransitionOutcome::Applied(unit_ref))
    }

    fn next_for_pulling(&self, pmode_ids: &[String]) -> MessageUnitResult<Option<MessageUnit>> {
        if pmode_ids.is_empty() {
            return Ok(None);
        }
        let filter = UnitFilter::new()
            .direction(Direction::Out)
            .kind(MessageUnitKind::UserMessage)
            .pmode_ids(pmode_ids)
            .states(&[ProcessingState::AwaitingPull]);

        for candidate in self.find(filter)? {
            if self.claim_for_pull(&candidate.unit_ref())? {
                debug!(key = %candidate.key, message_id = %candidate.message_id, "Claimed message for pulling");
                return self.get(candidate.key);
            }
        }
        Ok(None)
    }
}
