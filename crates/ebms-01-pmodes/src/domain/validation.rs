//! # P-Mode Validation Rules
//!
//! Structural and semantic checks run before a P-Mode is admitted. All checks
//! are evaluated and their findings concatenated, so one run reports every
//! problem of a configuration.
//!
//! ## Checks
//!
//! | Area | Rule |
//! |------|------|
//! | MEP | MEP and binding recognized, binding belongs to MEP, leg count matches |
//! | Legs | Callback reply patterns carry an address |
//! | Security | Username tokens complete, keys and certificates resolvable |
//! | Pull | Sub-channel MPCs declared, unique and below the leg MPC |
//!
//! Which keys must be private is decided by the engine's role: the party
//! this engine plays holds private keys, the counterparty only certificates.
//! Pull-request flows belong to the initiator, the side that pulls.

use super::pmode::{Leg, ProcessingMode, ReplyPattern};
use super::security::{SecurityConfig, UsernameTokenTarget};
use crate::ports::outbound::{CertificateUsage, CredentialResolver};
use serde::{Deserialize, Serialize};
use shared_types::{is_blank, is_sub_channel};
use std::fmt;

/// One violated rule, located by the path of the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Runs every rule against `pmode`.
pub fn validate_pmode(
    pmode: &ProcessingMode,
    credentials: &dyn CredentialResolver,
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    check_mep(pmode, &mut issues);
    for (i, leg) in pmode.legs.iter().enumerate() {
        check_reply_patterns(leg, &format!("legs[{i}]"), &mut issues);
    }
    check_security(pmode, credentials, &mut issues);
    for (i, leg) in pmode.legs.iter().enumerate() {
        check_pull_sub_channels(leg, &format!("legs[{i}]"), &mut issues);
    }
    issues
}

fn check_mep(pmode: &ProcessingMode, issues: &mut Vec<ValidationIssue>) {
    let mep = pmode.mep();
    let binding = pmode.mep_binding();

    if mep.is_none() {
        if pmode.mep.trim().is_empty() {
            issues.push(ValidationIssue::new("mep", "MEP must be specified"));
        } else {
            issues.push(ValidationIssue::new(
                "mep",
                format!("Unrecognized MEP '{}'", pmode.mep),
            ));
        }
    }

    if binding.is_none() {
        if pmode.mep_binding.trim().is_empty() {
            issues.push(ValidationIssue::new("mep_binding", "MEP binding must be specified"));
        } else {
            issues.push(ValidationIssue::new(
                "mep_binding",
                format!("Unrecognized MEP binding '{}'", pmode.mep_binding),
            ));
        }
    }

    if let (Some(mep), Some(binding)) = (mep, binding) {
        if binding.mep() != mep {
            issues.push(ValidationIssue::new(
                "mep_binding",
                format!("MEP binding {binding} can not be used with {mep} MEP"),
            ));
        }
    }

    if let Some(mep) = mep {
        if pmode.legs.len() != mep.leg_count() {
            issues.push(ValidationIssue::new(
                "legs",
                format!(
                    "{mep} MEP requires {} leg(s), found {}",
                    mep.leg_count(),
                    pmode.legs.len()
                ),
            ));
        }
    }
}

fn check_reply_patterns(leg: &Leg, path: &str, issues: &mut Vec<ValidationIssue>) {
    if let Some(receipt) = &leg.receipt {
        if receipt.pattern == ReplyPattern::Callback && is_blank(receipt.to.as_deref()) {
            issues.push(ValidationIssue::new(
                format!("{path}.receipt.to"),
                "Callback address must be specified when receipts use the callback pattern",
            ));
        }
    }
    if let Some(errors) = &leg.error_handling {
        if errors.pattern == Some(ReplyPattern::Callback)
            && is_blank(errors.receiver_errors_to.as_deref())
        {
            issues.push(ValidationIssue::new(
                format!("{path}.error_handling.receiver_errors_to"),
                "Callback address must be specified when errors use the callback pattern",
            ));
        }
    }
}

fn check_security(
    pmode: &ProcessingMode,
    credentials: &dyn CredentialResolver,
    issues: &mut Vec<ValidationIssue>,
) {
    let engine_is_initiator = pmode.is_engine_initiator();

    if let Some(security) = pmode.initiator.as_ref().and_then(|p| p.security.as_ref()) {
        check_security_config(
            security,
            "initiator.security",
            engine_is_initiator,
            credentials,
            issues,
        );
    }
    if let Some(security) = pmode.responder.as_ref().and_then(|p| p.security.as_ref()) {
        check_security_config(
            security,
            "responder.security",
            !engine_is_initiator,
            credentials,
            issues,
        );
    }
    for (i, leg) in pmode.legs.iter().enumerate() {
        for (j, flow) in leg.pull_request_flows.iter().enumerate() {
            if let Some(security) = &flow.security {
                check_security_config(
                    security,
                    &format!("legs[{i}].pull_request_flows[{j}].security"),
                    engine_is_initiator,
                    credentials,
                    issues,
                );
            }
        }
    }
}

/// Checks one security configuration.
///
/// `holds_private_keys` is true when the configuration belongs to the party
/// this engine acts as.
fn check_security_config(
    security: &SecurityConfig,
    path: &str,
    holds_private_keys: bool,
    credentials: &dyn CredentialResolver,
    issues: &mut Vec<ValidationIssue>,
) {
    for target in [UsernameTokenTarget::Default, UsernameTokenTarget::Ebms] {
        if let Some(token) = security.username_token(target) {
            if is_blank(token.username.as_deref()) {
                issues.push(ValidationIssue::new(
                    format!("{path}.{target}.username"),
                    "Username must be specified",
                ));
            }
            if is_blank(token.password.as_deref()) {
                issues.push(ValidationIssue::new(
                    format!("{path}.{target}.password"),
                    "Password must be specified",
                ));
            }
        }
    }

    if let Some(signing) = &security.signature {
        let alias_path = format!("{path}.signature.keystore_alias");
        match signing.keystore_alias.as_deref().filter(|a| !a.trim().is_empty()) {
            Some(alias) if holds_private_keys => {
                let password = signing.certificate_password.as_deref().unwrap_or("");
                if !credentials.has_private_key(alias, password) {
                    issues.push(ValidationIssue::new(
                        alias_path,
                        format!("No private key available for alias '{alias}' with the given password"),
                    ));
                }
            }
            Some(alias) => {
                if !credentials.has_certificate(alias, CertificateUsage::Signing) {
                    issues.push(ValidationIssue::new(
                        alias_path,
                        format!("No certificate available for alias '{alias}' to verify signatures"),
                    ));
                }
            }
            // The counterparty's certificate may be included in the message
            None if holds_private_keys => {
                issues.push(ValidationIssue::new(
                    alias_path,
                    "Key store alias must be specified for signing",
                ));
            }
            None => {}
        }
    }

    if let Some(encryption) = &security.encryption {
        let alias_path = format!("{path}.encryption.keystore_alias");
        match encryption.keystore_alias.as_deref().filter(|a| !a.trim().is_empty()) {
            Some(alias) if holds_private_keys => {
                let password = encryption.certificate_password.as_deref().unwrap_or("");
                if !credentials.has_private_key(alias, password) {
                    issues.push(ValidationIssue::new(
                        alias_path,
                        format!("No private key available for alias '{alias}' with the given password"),
                    ));
                }
            }
            Some(alias) => {
                if !credentials.has_certificate(alias, CertificateUsage::Encryption) {
                    issues.push(ValidationIssue::new(
                        alias_path,
                        format!("No certificate available for alias '{alias}' to encrypt with"),
                    ));
                }
            }
            None => {
                issues.push(ValidationIssue::new(
                    alias_path,
                    "Key store alias must be specified for encryption",
                ));
            }
        }
    }
}

fn check_pull_sub_channels(leg: &Leg, path: &str, issues: &mut Vec<ValidationIssue>) {
    let flows = &leg.pull_request_flows;
    let main_mpc = leg.main_mpc();
    let mut seen: Vec<(usize, &str)> = Vec::with_capacity(flows.len());

    for (j, flow) in flows.iter().enumerate() {
        let mpc_path = format!("{path}.pull_request_flows[{j}].mpc");
        let Some(mpc) = flow.declared_mpc() else {
            if flows.len() > 1 {
                issues.push(ValidationIssue::new(
                    mpc_path,
                    "MPC must be specified when a leg has multiple pull request flows",
                ));
            }
            continue;
        };

        if let Some((k, _)) = seen.iter().find(|(_, other)| other.eq_ignore_ascii_case(mpc)) {
            issues.push(ValidationIssue::new(
                mpc_path.clone(),
                format!("MPC '{mpc}' is already used by pull request flow {k}"),
            ));
        }
        seen.push((j, mpc));

        if let Some(main) = main_mpc {
            if !is_sub_channel(mpc, main) {
                issues.push(ValidationIssue::new(
                    mpc_path,
                    format!("MPC '{mpc}' is not a sub-channel of the leg MPC '{main}'"),
                ));
            }
        }
    }
}
