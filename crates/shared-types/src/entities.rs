//! # Core ebMS Entities
//!
//! Message-level metadata as extracted from a received ebMS3 header, plus the
//! small vocabulary shared by every crate of the core.
//!
//! ## Clusters
//!
//! - **Parties**: `PartyId`, `TradingPartner`
//! - **Collaboration**: `Service`, `AgreementReference`, `CollaborationInfo`
//! - **Message**: `UserMessageMetadata`, `Direction`

use crate::errors::ParseError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Timestamp in milliseconds since UNIX epoch.
pub type Timestamp = u64;

/// The MPC used when neither the message nor the P-Mode names one.
pub const DEFAULT_MPC: &str =
    "http://docs.oasis-open.org/ebxml-msg/ebms/v3.0/ns/core/200704/defaultMPC";

/// Returns `mpc` or the default MPC when it is absent or empty.
pub fn mpc_or_default(mpc: Option<&str>) -> &str {
    match mpc {
        Some(value) if !value.trim().is_empty() => value,
        _ => DEFAULT_MPC,
    }
}

/// Checks whether `candidate` is a sub-channel of `parent`.
///
/// Sub-channels are expressed by extending the parent MPC, so the check is a
/// case-insensitive prefix test. Every MPC is a sub-channel of itself.
pub fn is_sub_channel(candidate: &str, parent: &str) -> bool {
    candidate
        .to_ascii_lowercase()
        .starts_with(&parent.to_ascii_lowercase())
}

/// Treats `None`, empty and whitespace-only strings alike.
pub fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

// =============================================================================
// DIRECTION
// =============================================================================

/// Whether a message unit was received or is being sent by this engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    In,
    Out,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::In => write!(f, "IN"),
            Direction::Out => write!(f, "OUT"),
        }
    }
}

impl FromStr for Direction {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IN" => Ok(Direction::In),
            "OUT" => Ok(Direction::Out),
            _ => Err(ParseError::UnknownDirection(s.to_string())),
        }
    }
}

// =============================================================================
// PARTIES
// =============================================================================

/// Identifier of a business partner, optionally qualified by a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartyId {
    pub id: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub party_type: Option<String>,
}

impl PartyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            party_type: None,
        }
    }

    pub fn typed(id: impl Into<String>, party_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            party_type: Some(party_type.into()),
        }
    }
}

/// Compares two collections of party ids as sets.
///
/// An empty type and a missing type are considered equal.
pub fn party_ids_equal(left: &[PartyId], right: &[PartyId]) -> bool {
    fn normalized(ids: &[PartyId]) -> HashSet<(&str, &str)> {
        ids.iter()
            .map(|p| (p.id.as_str(), p.party_type.as_deref().unwrap_or("")))
            .collect()
    }
    normalized(left) == normalized(right)
}

/// Sender or receiver of a message as stated in its header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingPartner {
    #[serde(default)]
    pub party_ids: Vec<PartyId>,
    #[serde(default)]
    pub role: Option<String>,
}

impl TradingPartner {
    pub fn new(party_ids: Vec<PartyId>, role: impl Into<String>) -> Self {
        Self {
            party_ids,
            role: Some(role.into()),
        }
    }
}

// =============================================================================
// COLLABORATION
// =============================================================================

/// Business service a message belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
}

impl Service {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            service_type: None,
        }
    }
}

/// The `AgreementRef` element of a message header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgreementReference {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub agreement_type: Option<String>,
    #[serde(default)]
    pub pmode_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollaborationInfo {
    #[serde(default)]
    pub agreement: Option<AgreementReference>,
    #[serde(default)]
    pub service: Service,
    #[serde(default)]
    pub action: Option<String>,
}

// =============================================================================
// MESSAGE
// =============================================================================

/// Header data of a received User Message used to resolve its P-Mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMessageMetadata {
    pub message_id: String,
    #[serde(default)]
    pub mpc: Option<String>,
    #[serde(default)]
    pub sender: TradingPartner,
    #[serde(default)]
    pub receiver: TradingPartner,
    #[serde(default)]
    pub collaboration: CollaborationInfo,
}

impl UserMessageMetadata {
    /// The P-Mode id the sender referenced in the agreement reference, if any.
    pub fn referenced_pmode_id(&self) -> Option<&str> {
        self.collaboration
            .agreement
            .as_ref()
            .and_then(|a| a.pmode_id.as_deref())
            .filter(|id| !id.is_empty())
    }

    /// The message MPC, defaulted when the header has none.
    pub fn effective_mpc(&self) -> &str {
        mpc_or_default(self.mpc.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mpc_defaults() {
        assert_eq!(mpc_or_default(None), DEFAULT_MPC);
        assert_eq!(mpc_or_default(Some("  ")), DEFAULT_MPC);
        assert_eq!(mpc_or_default(Some("urn:mpc")), "urn:mpc");
    }

    #[test]
    fn test_sub_channel_is_prefix() {
        assert!(is_sub_channel("mpc/sub", "mpc"));
        assert!(is_sub_channel("MPC/Sub", "mpc"));
        assert!(is_sub_channel("mpc", "mpc"));
        assert!(!is_sub_channel("mpc", "mpc/sub"));
        assert!(!is_sub_channel("other", "mpc"));
    }

    #[test]
    fn test_party_ids_compare_as_sets() {
        let a = vec![PartyId::new("A"), PartyId::typed("B", "urn:t")];
        let b = vec![PartyId::typed("B", "urn:t"), PartyId::new("A")];
        let c = vec![PartyId::new("A"), PartyId::new("B")];
        assert!(party_ids_equal(&a, &b));
        assert!(!party_ids_equal(&a, &c));
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!("in".parse::<Direction>().unwrap(), Direction::In);
        assert_eq!(Direction::Out.to_string(), "OUT");
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn test_referenced_pmode_id_ignores_empty() {
        let mut meta = UserMessageMetadata::default();
        assert_eq!(meta.referenced_pmode_id(), None);

        meta.collaboration.agreement = Some(AgreementReference {
            pmode_id: Some(String::new()),
            ..Default::default()
        });
        assert_eq!(meta.referenced_pmode_id(), None);

        meta.collaboration.agreement = Some(AgreementReference {
            pmode_id: Some("pm-1".into()),
            ..Default::default()
        });
        assert_eq!(meta.referenced_pmode_id(), Some("pm-1"));
    }
}
