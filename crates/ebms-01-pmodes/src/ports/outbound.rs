//! Driven Ports (SPI - Outbound Dependencies)
//!
//! The store and the validator are replaceable: the runtime selects the
//! implementation by name at startup and hands it to `PModeManager`.

use crate::domain::pmode::ProcessingMode;
use crate::domain::validation::ValidationIssue;
use crate::error::PModeStoreResult;
use std::sync::Arc;

/// Collection of the P-Modes currently in effect.
///
/// Mutations are mutually exclusive. Reads return point-in-time snapshots
/// and never observe a half-applied mutation.
pub trait PModeSet: Send + Sync {
    /// Adds a P-Mode, generating an id when it has none.
    ///
    /// # Returns
    /// The id under which the P-Mode was stored.
    fn add(&self, pmode: ProcessingMode) -> PModeStoreResult<String>;

    /// Replaces the P-Mode with the same id.
    fn replace(&self, pmode: ProcessingMode) -> PModeStoreResult<()>;

    fn remove(&self, id: &str) -> PModeStoreResult<()>;

    fn get(&self, id: &str) -> Option<Arc<ProcessingMode>>;

    /// Snapshot of all P-Modes in insertion order.
    fn get_all(&self) -> Vec<Arc<ProcessingMode>>;

    fn contains_id(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    fn len(&self) -> usize {
        self.get_all().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Checks a P-Mode before it is admitted to the store.
pub trait PModeValidator: Send + Sync {
    /// Returns every violated rule; an empty list means the P-Mode is valid.
    fn validate(&self, pmode: &ProcessingMode) -> Vec<ValidationIssue>;
}

/// What a certificate is going to be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CertificateUsage {
    Signing,
    Encryption,
}

/// Access to the key store, used only to check that referenced keys exist.
pub trait CredentialResolver: Send + Sync {
    /// True if a private key is stored under `alias` and `password` unlocks it.
    fn has_private_key(&self, alias: &str, password: &str) -> bool;

    /// True if a certificate usable for `usage` is stored under `alias`.
    fn has_certificate(&self, alias: &str, usage: CertificateUsage) -> bool;
}
