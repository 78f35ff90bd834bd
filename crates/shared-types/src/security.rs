//! # Authentication Evidence
//!
//! Outcome of the WS-Security processing of a received message, as handed to
//! the core. The cryptographic work happens elsewhere; the core only compares
//! what was presented against what a P-Mode requires.
//!
//! ## Scopes
//!
//! | Scope | Meaning |
//! |-------|---------|
//! | `default-username-token` | Username token in the default WS-Security header |
//! | `ebms-username-token` | Username token in the header targeted at the `ebms` role |
//! | `signature` | Certificate used to sign the message |

use crate::errors::ParseError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Key under which a piece of evidence was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EvidenceScope {
    DefaultUsernameToken,
    EbmsUsernameToken,
    Signature,
}

impl EvidenceScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceScope::DefaultUsernameToken => "default-username-token",
            EvidenceScope::EbmsUsernameToken => "ebms-username-token",
            EvidenceScope::Signature => "signature",
        }
    }
}

impl fmt::Display for EvidenceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvidenceScope {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default-username-token" => Ok(EvidenceScope::DefaultUsernameToken),
            "ebms-username-token" => Ok(EvidenceScope::EbmsUsernameToken),
            "signature" => Ok(EvidenceScope::Signature),
            other => Err(ParseError::UnknownEvidenceScope(other.to_string())),
        }
    }
}

/// How the password of a username token is transferred.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PasswordType {
    #[default]
    Text,
    Digest,
}

/// A processed username token.
///
/// `password` is the clear-text password the security processor validated
/// the token against, also for `Digest` tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsernameTokenEvidence {
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub password_type: PasswordType,
}

/// The certificate a received message was signed with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureEvidence {
    /// Alias under which the signing certificate is known to the key store.
    pub certificate_alias: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Evidence {
    UsernameToken(UsernameTokenEvidence),
    Signature(SignatureEvidence),
}

/// All evidence presented with one message, keyed by scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationEvidence {
    entries: HashMap<EvidenceScope, Evidence>,
}

impl AuthenticationEvidence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_username_token(mut self, scope: EvidenceScope, token: UsernameTokenEvidence) -> Self {
        self.entries.insert(scope, Evidence::UsernameToken(token));
        self
    }

    pub fn with_signature(mut self, signature: SignatureEvidence) -> Self {
        self.entries
            .insert(EvidenceScope::Signature, Evidence::Signature(signature));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Username token presented under `scope`, if the entry is one.
    pub fn username_token(&self, scope: EvidenceScope) -> Option<&UsernameTokenEvidence> {
        match self.entries.get(&scope) {
            Some(Evidence::UsernameToken(token)) => Some(token),
            _ => None,
        }
    }

    pub fn signature(&self) -> Option<&SignatureEvidence> {
        match self.entries.get(&EvidenceScope::Signature) {
            Some(Evidence::Signature(sig)) => Some(sig),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(user: &str) -> UsernameTokenEvidence {
        UsernameTokenEvidence {
            username: user.into(),
            password: Some("secret".into()),
            password_type: PasswordType::Text,
        }
    }

    #[test]
    fn test_scope_round_trips_through_str() {
        for scope in [
            EvidenceScope::DefaultUsernameToken,
            EvidenceScope::EbmsUsernameToken,
            EvidenceScope::Signature,
        ] {
            assert_eq!(scope.as_str().parse::<EvidenceScope>().unwrap(), scope);
        }
        assert!("kerberos".parse::<EvidenceScope>().is_err());
    }

    #[test]
    fn test_typed_accessors_respect_scope() {
        let evidence = AuthenticationEvidence::new()
            .with_username_token(EvidenceScope::EbmsUsernameToken, token("alice"))
            .with_signature(SignatureEvidence {
                certificate_alias: "partner-a".into(),
            });

        assert!(!evidence.is_empty());
        assert_eq!(
            evidence
                .username_token(EvidenceScope::EbmsUsernameToken)
                .map(|t| t.username.as_str()),
            Some("alice")
        );
        assert!(evidence
            .username_token(EvidenceScope::DefaultUsernameToken)
            .is_none());
        assert_eq!(
            evidence.signature().map(|s| s.certificate_alias.as_str()),
            Some("partner-a")
        );
    }

    #[test]
    fn test_scope_serializes_kebab_case() {
        let json = serde_json::to_string(&EvidenceScope::EbmsUsernameToken).unwrap();
        assert_eq!(json, "\"ebms-username-token\"");
    }
}
