//! `PModeValidator` implementations.

use crate::domain::pmode::ProcessingMode;
use crate::domain::validation::{validate_pmode, ValidationIssue};
use crate::ports::outbound::{CredentialResolver, PModeValidator};
use std::sync::Arc;

/// Runs the complete rule set, resolving key aliases through `credentials`.
pub struct BasicPModeValidator {
    credentials: Arc<dyn CredentialResolver>,
}

impl BasicPModeValidator {
    pub fn new(credentials: Arc<dyn CredentialResolver>) -> Self {
        Self { credentials }
    }
}

impl PModeValidator for BasicPModeValidator {
    fn validate(&self, pmode: &ProcessingMode) -> Vec<ValidationIssue> {
        validate_pmode(pmode, self.credentials.as_ref())
    }
}

/// Accepts every P-Mode. For deployments that validate P-Modes elsewhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAllValidator;

impl PModeValidator for AcceptAllValidator {
    fn validate(&self, _pmode: &ProcessingMode) -> Vec<ValidationIssue> {
        Vec::new()
    }
}
