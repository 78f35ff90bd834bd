//! Driving Ports (API - Inbound)
//!
//! Used by the message-processing pipeline and by administration tooling.

use crate::domain::pmode::ProcessingMode;
use crate::error::PModeResult;
use shared_types::{AuthenticationEvidence, UserMessageMetadata};
use std::sync::Arc;

/// Administration of the active P-Mode set.
///
/// Every P-Mode is validated before it is admitted; an invalid P-Mode is
/// rejected with the complete list of violated rules.
pub trait PModeManagementApi: Send + Sync {
    /// Validates and adds a P-Mode.
    ///
    /// # Returns
    /// The id of the stored P-Mode, generated when the P-Mode had none.
    fn add(&self, pmode: ProcessingMode) -> PModeResult<String>;

    /// Validates and replaces the P-Mode with the same id.
    fn replace(&self, pmode: ProcessingMode) -> PModeResult<()>;

    fn remove(&self, id: &str) -> PModeResult<()>;

    fn get(&self, id: &str) -> Option<Arc<ProcessingMode>>;

    fn get_all(&self) -> Vec<Arc<ProcessingMode>>;
}

/// Resolution of the P-Mode that governs a message.
pub trait PModeMatchingApi: Send + Sync {
    /// The best matching P-Mode for a received User Message, if any.
    fn find_for_received_user_message(
        &self,
        message: &UserMessageMetadata,
    ) -> Option<Arc<ProcessingMode>>;

    /// The P-Modes a Pull Request on `mpc` may take messages from.
    fn find_for_pulling(
        &self,
        mpc: &str,
        evidence: &AuthenticationEvidence,
    ) -> Vec<Arc<ProcessingMode>>;

    /// The P-Mode a submitted message references.
    fn find_for_sending(&self, pmode_id: &str) -> Option<Arc<ProcessingMode>>;
}
