//! # P-Mode Matching
//!
//! Weighted scoring that selects the P-Mode governing a received User
//! Message. Every candidate either gets disqualified by a hard mismatch or
//! collects the weights of the elements it matches; the highest score wins
//! and ties keep the candidate found first.
//!
//! ## Weights
//!
//! | Criterion | Weight |
//! |-----------|--------|
//! | P-Mode id (agreement reference) | 37 |
//! | From party ids | 7 |
//! | From role | 2 |
//! | To party ids | 7 |
//! | To role | 2 |
//! | Service | 5 |
//! | Action | 5 |
//! | MPC | 1 |
//! | Agreement name and type | 1 |
//!
//! The P-Mode id outweighs every other criterion combined (36), so an
//! explicit reference always wins over heuristics.

use super::pmode::{Leg, ProcessingMode, TradingPartnerConfig};
use shared_types::{
    is_sub_channel, mpc_or_default, party_ids_equal, TradingPartner, UserMessageMetadata,
};
use std::sync::Arc;

pub mod weights {
    pub const PMODE_ID: u32 = 37;
    pub const FROM_PARTY_IDS: u32 = 7;
    pub const FROM_ROLE: u32 = 2;
    pub const TO_PARTY_IDS: u32 = 7;
    pub const TO_ROLE: u32 = 2;
    pub const SERVICE: u32 = 5;
    pub const ACTION: u32 = 5;
    pub const MPC: u32 = 1;
    pub const AGREEMENT: u32 = 1;
}

/// Outcome of comparing two optional values, blanks counting as absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    BothAbsent,
    OnlyMessage,
    OnlyPMode,
    Equal,
    Different,
}

/// Compares a value from the message with the one from the P-Mode.
pub fn compare(message: Option<&str>, pmode: Option<&str>) -> Presence {
    let message = message.filter(|v| !v.trim().is_empty());
    let pmode = pmode.filter(|v| !v.trim().is_empty());
    match (message, pmode) {
        (None, None) => Presence::BothAbsent,
        (Some(_), None) => Presence::OnlyMessage,
        (None, Some(_)) => Presence::OnlyPMode,
        (Some(m), Some(p)) if m == p => Presence::Equal,
        _ => Presence::Different,
    }
}

/// P-Modes that tell this engine to push the message itself are used for
/// sending only and never match a received message.
pub fn is_receiving_candidate(pmode: &ProcessingMode) -> bool {
    !(pmode.is_one_way_push() && pmode.is_engine_initiator())
}

/// Scores `pmode` against `message`.
///
/// # Returns
/// - `Some(score)`: no hard mismatch
/// - `None`: the P-Mode is disqualified
pub fn score(pmode: &ProcessingMode, message: &UserMessageMetadata) -> Option<u32> {
    let mut total = 0;

    if message.referenced_pmode_id() == Some(pmode.id.as_str()) {
        total += weights::PMODE_ID;
    }

    total += score_agreement(pmode, message)?;

    // The sender of a pushed message is the initiator, otherwise the responder
    let (from, to) = if pmode.is_one_way_push() {
        (pmode.initiator.as_ref(), pmode.responder.as_ref())
    } else {
        (pmode.responder.as_ref(), pmode.initiator.as_ref())
    };
    total += score_party(
        from,
        &message.sender,
        weights::FROM_PARTY_IDS,
        weights::FROM_ROLE,
    )?;
    total += score_party(to, &message.receiver, weights::TO_PARTY_IDS, weights::TO_ROLE)?;

    let leg = pmode.first_leg();
    total += score_business_info(leg, message)?;
    total += score_mpc(pmode, leg, message)?;

    Some(total)
}

fn score_agreement(pmode: &ProcessingMode, message: &UserMessageMetadata) -> Option<u32> {
    let Some(agreement) = pmode.agreement.as_ref() else {
        return Some(0);
    };
    let reference = message.collaboration.agreement.as_ref();

    match compare(
        reference.and_then(|r| r.name.as_deref()),
        agreement.name.as_deref(),
    ) {
        Presence::Different => None,
        Presence::Equal => match compare(
            reference.and_then(|r| r.agreement_type.as_deref()),
            agreement.agreement_type.as_deref(),
        ) {
            Presence::Equal | Presence::BothAbsent => Some(weights::AGREEMENT),
            _ => None,
        },
        // Declared on one side only: neither a match nor a mismatch
        Presence::BothAbsent | Presence::OnlyMessage | Presence::OnlyPMode => Some(0),
    }
}

fn score_party(
    config: Option<&TradingPartnerConfig>,
    actual: &TradingPartner,
    ids_weight: u32,
    role_weight: u32,
) -> Option<u32> {
    let Some(config) = config else {
        return Some(0);
    };
    let mut total = 0;

    if !config.party_ids.is_empty() {
        if !party_ids_equal(&config.party_ids, &actual.party_ids) {
            return None;
        }
        total += ids_weight;
    }

    if let Some(role) = config.role.as_deref().filter(|r| !r.trim().is_empty()) {
        if actual.role.as_deref() != Some(role) {
            return None;
        }
        total += role_weight;
    }

    Some(total)
}

fn score_business_info(leg: Option<&Leg>, message: &UserMessageMetadata) -> Option<u32> {
    let Some(info) = leg.and_then(Leg::business_info) else {
        return Some(0);
    };
    let collaboration = &message.collaboration;
    let mut total = 0;

    if let Some(service) = info.service.as_ref().filter(|s| !s.name.trim().is_empty()) {
        if service.name != collaboration.service.name {
            return None;
        }
        if compare(
            collaboration.service.service_type.as_deref(),
            service.service_type.as_deref(),
        ) == Presence::Different
        {
            return None;
        }
        total += weights::SERVICE;
    }

    match compare(collaboration.action.as_deref(), info.action.as_deref()) {
        Presence::Equal => total += weights::ACTION,
        Presence::Different => return None,
        _ => {}
    }

    Some(total)
}

fn score_mpc(pmode: &ProcessingMode, leg: Option<&Leg>, message: &UserMessageMetadata) -> Option<u32> {
    let message_mpc = message.effective_mpc();
    let leg_mpc = mpc_or_default(leg.and_then(Leg::main_mpc));

    let matched = if pmode.is_one_way_pull() {
        // Pulled messages may come from a sub-channel of the message MPC
        let flow_mpcs: Vec<&str> = leg
            .map(|l| {
                l.pull_request_flows
                    .iter()
                    .filter_map(|f| f.declared_mpc())
                    .collect()
            })
            .unwrap_or_default();
        if flow_mpcs.is_empty() {
            is_sub_channel(leg_mpc, message_mpc)
        } else {
            flow_mpcs.iter().any(|mpc| is_sub_channel(mpc, message_mpc))
        }
    } else {
        leg_mpc.eq_ignore_ascii_case(message_mpc)
    };

    matched.then_some(weights::MPC)
}

/// Picks the highest scoring candidate; ties keep the first one.
///
/// # Returns
/// The winning P-Mode with its score, or `None` when every candidate was
/// skipped or disqualified.
pub fn select_best(
    candidates: &[Arc<ProcessingMode>],
    message: &UserMessageMetadata,
) -> Option<(Arc<ProcessingMode>, u32)> {
    let mut best: Option<(Arc<ProcessingMode>, u32)> = None;

    for pmode in candidates.iter().filter(|p| is_receiving_candidate(p)) {
        let Some(value) = score(pmode, message) else {
            continue;
        };
        if best.as_ref().map_or(true, |(_, top)| value > *top) {
            best = Some((Arc::clone(pmode), value));
        }
    }

    best
}
