//! Driving Ports (API - Inbound)
//!
//! Used by the message-processing pipeline. Every method is a single
//! transactional round trip on the repository.

use crate::domain::{
    MessageUnit, NewMessageUnit, ProcessingState, TransitionOutcome, UnitKey, UnitRef,
};
use crate::error::MessageUnitResult;
use shared_types::Direction;

pub trait MessageUnitApi: Send + Sync {
    /// Stores a unit this engine is going to send.
    ///
    /// Starts in SUBMITTED for user messages and CREATED for signals.
    ///
    /// # Errors
    /// `MessageUnitError::DuplicateMessageId` if an outgoing unit already
    /// uses the message id.
    fn store_outgoing(&self, unit: NewMessageUnit) -> MessageUnitResult<MessageUnit>;

    /// Stores a received unit in state RECEIVED. Message ids are not checked
    /// for uniqueness; duplicate detection is a processing step.
    fn store_incoming(&self, unit: NewMessageUnit) -> MessageUnitResult<MessageUnit>;

    fn get(&self, key: UnitKey) -> MessageUnitResult<Option<MessageUnit>>;

    fn find_by_message_id(&self, message_id: &str) -> MessageUnitResult<Vec<MessageUnit>>;

    fn find_by_ref_to_message_id(&self, message_id: &str) -> MessageUnitResult<Vec<MessageUnit>>;

    /// Units of `direction` whose current state is one of `states`.
    fn find_in_state(
        &self,
        direction: Direction,
        states: &[ProcessingState],
    ) -> MessageUnitResult<Vec<MessageUnit>>;

    fn find_for_pmodes_in_state(
        &self,
        pmode_ids: &[String],
        state: ProcessingState,
    ) -> MessageUnitResult<Vec<MessageUnit>>;

    /// Records the governing P-Mode.
    fn set_pmode_id(&self, unit: &UnitRef, pmode_id: Option<String>) -> MessageUnitResult<bool>;

    /// Appends `new_state` if the unit is currently in `required`, or
    /// unconditionally when `required` is `None`.
    ///
    /// Losing a race against another writer yields
    /// `TransitionOutcome::Conflict`, never an error.
    fn set_processing_state(
        &self,
        unit: &UnitRef,
        new_state: ProcessingState,
        required: Option<ProcessingState>,
        description: Option<String>,
    ) -> MessageUnitResult<TransitionOutcome>;

    /// Claims the oldest outgoing user message waiting to be pulled under
    /// any of `pmode_ids`.
    ///
    /// # Returns
    /// The claimed unit, now in PROCESSING, or `None` if nothing could be
    /// claimed.
    fn next_for_pulling(&self, pmode_ids: &[String]) -> MessageUnitResult<Option<MessageUnit>>;

    fn transition(
        &self,
        unit: &UnitRef,
        new_state: ProcessingState,
        required: Option<ProcessingState>,
    ) -> MessageUnitResult<TransitionOutcome> {
        self.set_processing_state(unit, new_state, required, None)
    }

    // -------------------------------------------------------------------------
    // Guarded transitions: true only for the caller that made the change
    // -------------------------------------------------------------------------

    fn start_processing(&self, unit: &UnitRef) -> MessageUnitResult<bool> {
        guarded(self, unit, ProcessingState::Processing, ProcessingState::Received)
    }

    fn start_sending(&self, unit: &UnitRef) -> MessageUnitResult<bool> {
        guarded(self, unit, ProcessingState::Sending, ProcessingState::ReadyToPush)
    }

    fn start_delivery(&self, unit: &UnitRef) -> MessageUnitResult<bool> {
        guarded(
            self,
            unit,
            ProcessingState::OutForDelivery,
            ProcessingState::ReadyForDelivery,
        )
    }

    fn claim_for_pull(&self, unit: &UnitRef) -> MessageUnitResult<bool> {
        guarded(self, unit, ProcessingState::Processing, ProcessingState::AwaitingPull)
    }

    // -------------------------------------------------------------------------
    // Unconditional transitions
    // -------------------------------------------------------------------------

    fn set_ready_to_push(&self, unit: &UnitRef) -> MessageUnitResult<bool> {
        unconditional(self, unit, ProcessingState::ReadyToPush, None)
    }

    fn set_awaiting_pull(&self, unit: &UnitRef) -> MessageUnitResult<bool> {
        unconditional(self, unit, ProcessingState::AwaitingPull, None)
    }

    fn set_transport_failure(&self, unit: &UnitRef) -> MessageUnitResult<bool> {
        unconditional(self, unit, ProcessingState::TransportFailure, None)
    }

    fn set_awaiting_receipt(&self, unit: &UnitRef) -> MessageUnitResult<bool> {
        unconditional(self, unit, ProcessingState::AwaitingReceipt, None)
    }

    fn set_ready_for_delivery(&self, unit: &UnitRef) -> MessageUnitResult<bool> {
        unconditional(self, unit, ProcessingState::ReadyForDelivery, None)
    }

    fn set_delivered(&self, unit: &UnitRef) -> MessageUnitResult<bool> {
        unconditional(self, unit, ProcessingState::Delivered, None)
    }

    fn set_delivery_failed(&self, unit: &UnitRef) -> MessageUnitResult<bool> {
        unconditional(self, unit, ProcessingState::DeliveryFailed, None)
    }

    fn set_duplicate(&self, unit: &UnitRef) -> MessageUnitResult<bool> {
        unconditional(self, unit, ProcessingState::Duplicate, None)
    }

    fn set_done(&self, unit: &UnitRef) -> MessageUnitResult<bool> {
        unconditional(self, unit, ProcessingState::Done, None)
    }

    fn set_failed(&self, unit: &UnitRef, reason: Option<String>) -> MessageUnitResult<bool> {
        unconditional(self, unit, ProcessingState::Failure, reason)
    }

    fn set_warning(&self, unit: &UnitRef, reason: Option<String>) -> MessageUnitResult<bool> {
        unconditional(self, unit, ProcessingState::ProcWithWarning, reason)
    }
}

fn guarded<A: MessageUnitApi + ?Sized>(
    api: &A,
    unit: &UnitRef,
    new_state: ProcessingState,
    required: ProcessingState,
) -> MessageUnitResult<bool> {
    api.set_processing_state(unit, new_state, Some(required), None)
        .map(|outcome| outcome.is_applied())
}

fn unconditional<A: MessageUnitApi + ?Sized>(
    api: &A,
    unit: &UnitRef,
    new_state: ProcessingState,
    description: Option<String>,
) -> MessageUnitResult<bool> {
    api.set_processing_state(unit, new_state, None, description)
        .map(|outcome| outcome.is_applied())
}
