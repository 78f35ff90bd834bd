//! # Pull Request Authorization
//!
//! Decides whether the authentication evidence found on a Pull Request
//! satisfies the security requirements of a P-Mode, and which P-Modes a
//! Pull Request may take messages from.
//!
//! ## Requirement Sources
//!
//! A pull-request flow may override the trading partner's settings for the
//! ebMS username token and the signature. The default username token is
//! always taken from the trading partner.

use super::pmode::{ProcessingMode, PullRequestFlow};
use super::security::{SecurityConfig, UsernameTokenConfig};
use shared_types::{
    is_sub_channel, AuthenticationEvidence, EvidenceScope, SignatureEvidence,
    UsernameTokenEvidence,
};
use std::sync::Arc;

/// Checks `evidence` against the requirements of a pull-request flow and
/// its trading partner.
///
/// # Rules
/// - No requirement at all: authorized only when no evidence was provided
/// - Requirement but no evidence: denied
/// - Otherwise every required item must be matched by the evidence
pub fn authorize(
    flow: Option<&SecurityConfig>,
    partner: Option<&SecurityConfig>,
    evidence: &AuthenticationEvidence,
) -> bool {
    let required = flow.map_or(false, SecurityConfig::has_authentication_requirement)
        || partner.map_or(false, SecurityConfig::has_authentication_requirement);

    if !required {
        return evidence.is_empty();
    }
    if evidence.is_empty() {
        return false;
    }

    let ebms_token = flow
        .and_then(|s| s.ebms_username_token.as_ref())
        .or_else(|| partner.and_then(|s| s.ebms_username_token.as_ref()));
    let default_token = partner.and_then(|s| s.default_username_token.as_ref());
    let signature = flow
        .and_then(|s| s.signature.as_ref())
        .or_else(|| partner.and_then(|s| s.signature.as_ref()));

    token_satisfied(
        ebms_token,
        evidence.username_token(EvidenceScope::EbmsUsernameToken),
    ) && token_satisfied(
        default_token,
        evidence.username_token(EvidenceScope::DefaultUsernameToken),
    ) && signature.map_or(true, |required| {
        signature_matches(required.keystore_alias.as_deref(), evidence.signature())
    })
}

fn token_satisfied(
    required: Option<&UsernameTokenConfig>,
    actual: Option<&UsernameTokenEvidence>,
) -> bool {
    let Some(required) = required else {
        return true;
    };
    let Some(actual) = actual else {
        return false;
    };
    required.username.as_deref() == Some(actual.username.as_str())
        && required.password_type == actual.password_type
        && required.password == actual.password
}

fn signature_matches(alias: Option<&str>, actual: Option<&SignatureEvidence>) -> bool {
    match (alias.filter(|a| !a.trim().is_empty()), actual) {
        (_, None) => false,
        (None, Some(_)) => true,
        (Some(alias), Some(sig)) => sig.certificate_alias == alias,
    }
}

/// The pull-request flows of a leg that apply to a request on `mpc`.
///
/// Flows without an MPC apply to every channel of the leg.
pub fn applicable_flows<'a>(
    flows: &'a [PullRequestFlow],
    mpc: &'a str,
) -> impl Iterator<Item = &'a PullRequestFlow> + 'a {
    flows
        .iter()
        .filter(move |f| f.declared_mpc().map_or(true, |declared| is_sub_channel(mpc, declared)))
}

/// True if a Pull Request on `mpc` carrying `evidence` may take messages
/// sent under `pmode`.
pub fn is_pullable(pmode: &ProcessingMode, mpc: &str, evidence: &AuthenticationEvidence) -> bool {
    if !pmode.is_one_way_pull() || pmode.is_engine_initiator() {
        return false;
    }
    let Some(leg) = pmode.first_leg() else {
        return false;
    };
    if let Some(leg_mpc) = leg.main_mpc() {
        if !is_sub_channel(mpc, leg_mpc) {
            return false;
        }
    }

    let partner = pmode.initiator.as_ref().and_then(|i| i.security.as_ref());
    if leg.pull_request_flows.is_empty() {
        return authorize(None, partner, evidence);
    }
    applicable_flows(&leg.pull_request_flows, mpc)
        .any(|flow| authorize(flow.security.as_ref(), partner, evidence))
}

/// Every P-Mode in `candidates` a Pull Request may take messages from,
/// in encounter order.
pub fn find_pullable(
    candidates: &[Arc<ProcessingMode>],
    mpc: &str,
    evidence: &AuthenticationEvidence,
) -> Vec<Arc<ProcessingMode>> {
    candidates
        .iter()
        .filter(|p| is_pullable(p, mpc, evidence))
        .cloned()
        .collect()
}
