//! P-Mode services
//!
//! `PModeManager` gates every write into the store through the validator.
//! `PModeMatcher` answers which P-Mode governs a message, working on a
//! snapshot of the store so that concurrent administration never yields a
//! half-updated view.

use crate::domain::authorization::find_pullable;
use crate::domain::matching::select_best;
use crate::domain::pmode::ProcessingMode;
use crate::error::{PModeError, PModeResult};
use crate::ports::inbound::{PModeManagementApi, PModeMatchingApi};
use crate::ports::outbound::{PModeSet, PModeValidator};
use shared_types::{AuthenticationEvidence, UserMessageMetadata};
use std::sync::Arc;
use tracing::{debug, info, warn};

// =============================================================================
// MANAGER
// =============================================================================

pub struct PModeManager {
    store: Arc<dyn PModeSet>,
    validator: Arc<dyn PModeValidator>,
}

impl PModeManager {
    pub fn new(store: Arc<dyn PModeSet>, validator: Arc<dyn PModeValidator>) -> Self {
        Self { store, validator }
    }

    /// The store this manager writes to, for wiring a matcher on top of it.
    pub fn store(&self) -> Arc<dyn PModeSet> {
        Arc::clone(&self.store)
    }

    fn check(&self, pmode: &ProcessingMode) -> PModeResult<()> {
        let issues = self.validator.validate(pmode);
        if issues.is_empty() {
            return Ok(());
        }
        warn!(
            pmode_id = %pmode.id,
            issues = issues.len(),
            "Rejected invalid P-Mode"
        );
        for issue in &issues {
            debug!(pmode_id = %pmode.id, %issue, "P-Mode validation issue");
        }
        Err(PModeError::Invalid {
            id: pmode.id.clone(),
            issues,
        })
    }
}

impl PModeManagementApi for PModeManager {
    fn add(&self, pmode: ProcessingMode) -> PModeResult<String> {
        self.check(&pmode)?;
        let id = self.store.add(pmode)?;
        info!(pmode_id = %id, "Added P-Mode");
        Ok(id)
    }

    fn replace(&self, pmode: ProcessingMode) -> PModeResult<()> {
        self.check(&pmode)?;
        let id = pmode.id.clone();
        self.store.replace(pmode)?;
        info!(pmode_id = %id, "Replaced P-Mode");
        Ok(())
    }

    fn remove(&self, id: &str) -> PModeResult<()> {
        self.store.remove(id)?;
        info!(pmode_id = %id, "Removed P-Mode");
        Ok(())
    }

    fn get(&self, id: &str) -> Option<Arc<ProcessingMode>> {
        self.store.get(id)
    }

    fn get_all(&self) -> Vec<Arc<ProcessingMode>> {
        self.store.get_all()
    }
}

// =============================================================================
// MATCHER
// =============================================================================

pub struct PModeMatcher {
    store: Arc<dyn PModeSet>,
}

impl PModeMatcher {
    pub fn new(store: Arc<dyn PModeSet>) -> Self {
        Self { store }
    }
}

impl PModeMatchingApi for PModeMatcher {
    fn find_for_received_user_message(
        &self,
        message: &UserMessageMetadata,
    ) -> Option<Arc<ProcessingMode>> {
        let candidates = self.store.get_all();
        match select_best(&candidates, message) {
            Some((pmode, score)) => {
                debug!(
                    message_id = %message.message_id,
                    pmode_id = %pmode.id,
                    score,
                    "Matched P-Mode for received User Message"
                );
                Some(pmode)
            }
            None => {
                debug!(
                    message_id = %message.message_id,
                    candidates = candidates.len(),
                    "No P-Mode matches received User Message"
                );
                None
            }
        }
    }

    fn find_for_pulling(
        &self,
        mpc: &str,
        evidence: &AuthenticationEvidence,
    ) -> Vec<Arc<ProcessingMode>> {
        let found = find_pullable(&self.store.get_all(), mpc, evidence);
        debug!(mpc, authorized = found.len(), "Resolved P-Modes for Pull Request");
        found
    }

    fn find_for_sending(&self, pmode_id: &str) -> Option<Arc<ProcessingMode>> {
        self.store.get(pmode_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{AcceptAllValidator, BasicPModeValidator, InMemoryPModeSet, StaticCredentialResolver};
    use crate::domain::pmode::{Leg, Mep, MepBinding};
    use crate::error::PModeStoreError;

    fn manager(validator: Arc<dyn PModeValidator>) -> PModeManager {
        PModeManager::new(Arc::new(InMemoryPModeSet::new()), validator)
    }

    fn one_way(id: &str) -> ProcessingMode {
        ProcessingMode {
            id: id.into(),
            mep: Mep::OneWay.uri(),
            mep_binding: MepBinding::Push.uri(),
            legs: vec![Leg::default()],
            ..Default::default()
        }
    }

    #[test]
    fn test_invalid_pmode_is_not_admitted() {
        let mgr = manager(Arc::new(BasicPModeValidator::new(Arc::new(
            StaticCredentialResolver::new(),
        ))));
        let mut broken = one_way("broken");
        broken.legs.push(Leg::default());

        let err = mgr.add(broken).unwrap_err();
        assert!(matches!(err, PModeError::Invalid { .. }));
        assert!(!err.issues().is_empty());
        assert!(mgr.get("broken").is_none());
    }

    #[test]
    fn test_replace_is_validated() {
        let mgr = manager(Arc::new(BasicPModeValidator::new(Arc::new(
            StaticCredentialResolver::new(),
        ))));
        mgr.add(one_way("p")).unwrap();

        let mut broken = one_way("p");
        broken.mep_binding = MepBinding::PushPull.uri();
        assert!(mgr.replace(broken).is_err());
        assert_eq!(
            mgr.get("p").unwrap().mep_binding(),
            Some(MepBinding::Push)
        );
    }

    #[test]
    fn test_store_errors_pass_through() {
        let mgr = manager(Arc::new(AcceptAllValidator));
        mgr.add(one_way("p")).unwrap();
        assert_eq!(
            mgr.add(one_way("p")),
            Err(PModeError::Store(PModeStoreError::DuplicateId("p".into())))
        );
        assert_eq!(
            mgr.remove("missing"),
            Err(PModeError::Store(PModeStoreError::NotFound("missing".into())))
        );
    }

    #[test]
    fn test_matcher_reads_manager_store() {
        let mgr = manager(Arc::new(AcceptAllValidator));
        let matcher = PModeMatcher::new(mgr.store());
        mgr.add(one_way("p")).unwrap();

        let message = UserMessageMetadata {
            message_id: "m@test".into(),
            ..Default::default()
        };
        assert_eq!(
            matcher.find_for_received_user_message(&message).map(|p| p.id.clone()),
            Some("p".to_string())
        );
        assert!(matcher.find_for_sending("p").is_some());
        assert!(matcher.find_for_sending("q").is_none());
    }
}
