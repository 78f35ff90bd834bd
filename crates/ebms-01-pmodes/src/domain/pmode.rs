//! # Processing Mode (P-Mode)
//!
//! Configuration describing how a class of message exchanges is processed.
//! A P-Mode is immutable once it has been validated and admitted to the
//! store; changes are made by replacing it as a whole.
//!
//! ## Engine Role
//!
//! Whether this engine initiates the exchange is derived from the first leg:
//! a non-empty protocol address means this side sends (push) or pulls.
//!
//! ```text
//! OneWay/Push  + address  -> engine sends the User Message     (initiator)
//! OneWay/Push  - address  -> engine receives the User Message  (responder)
//! OneWay/Pull  + address  -> engine sends the Pull Request     (initiator)
//! OneWay/Pull  - address  -> engine answers Pull Requests      (responder)
//! ```

use super::security::SecurityConfig;
use serde::{Deserialize, Serialize};
use shared_types::{is_blank, PartyId, Service};
use std::fmt;

/// Namespace of the MEP and MEP binding URIs defined by ebMS3 Core.
pub const EBMS_CORE_NS: &str = "http://docs.oasis-open.org/ebxml-msg/ebms/v3.0/ns/core/200704/";

/// Strips the ebMS namespace and lower-cases the remaining local name.
fn local_name(uri: &str) -> String {
    let trimmed = uri.trim();
    trimmed
        .strip_prefix(EBMS_CORE_NS)
        .unwrap_or(trimmed)
        .to_ascii_lowercase()
}

// =============================================================================
// MEP AND BINDING
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mep {
    OneWay,
    TwoWay,
}

impl Mep {
    /// Parses the MEP URI, or its local name.
    pub fn from_uri(uri: &str) -> Option<Self> {
        match local_name(uri).as_str() {
            "oneway" => Some(Mep::OneWay),
            "twoway" => Some(Mep::TwoWay),
            _ => None,
        }
    }

    pub fn uri(&self) -> String {
        match self {
            Mep::OneWay => format!("{EBMS_CORE_NS}oneWay"),
            Mep::TwoWay => format!("{EBMS_CORE_NS}twoWay"),
        }
    }

    pub fn leg_count(&self) -> usize {
        match self {
            Mep::OneWay => 1,
            Mep::TwoWay => 2,
        }
    }
}

impl fmt::Display for Mep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mep::OneWay => write!(f, "One-Way"),
            Mep::TwoWay => write!(f, "Two-Way"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MepBinding {
    Push,
    Pull,
    PushPush,
    PushPull,
    PullPush,
    PullPull,
}

impl MepBinding {
    /// Parses the binding URI, or its local name.
    pub fn from_uri(uri: &str) -> Option<Self> {
        match local_name(uri).as_str() {
            "push" => Some(MepBinding::Push),
            "pull" => Some(MepBinding::Pull),
            "pushandpush" => Some(MepBinding::PushPush),
            "pushandpull" => Some(MepBinding::PushPull),
            "pullandpush" => Some(MepBinding::PullPush),
            "pullandpull" => Some(MepBinding::PullPull),
            _ => None,
        }
    }

    pub fn uri(&self) -> String {
        let local = match self {
            MepBinding::Push => "push",
            MepBinding::Pull => "pull",
            MepBinding::PushPush => "pushAndPush",
            MepBinding::PushPull => "pushAndPull",
            MepBinding::PullPush => "pullAndPush",
            MepBinding::PullPull => "pullAndPull",
        };
        format!("{EBMS_CORE_NS}{local}")
    }

    /// The MEP this binding belongs to.
    pub fn mep(&self) -> Mep {
        match self {
            MepBinding::Push | MepBinding::Pull => Mep::OneWay,
            _ => Mep::TwoWay,
        }
    }
}

impl fmt::Display for MepBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MepBinding::Push => "Push",
            MepBinding::Pull => "Pull",
            MepBinding::PushPush => "Push-and-Push",
            MepBinding::PushPull => "Push-and-Pull",
            MepBinding::PullPush => "Pull-and-Push",
            MepBinding::PullPull => "Pull-and-Pull",
        };
        f.write_str(name)
    }
}

// =============================================================================
// PARTIES AND AGREEMENT
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agreement {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub agreement_type: Option<String>,
}

/// Configuration of the initiating or responding trading partner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingPartnerConfig {
    #[serde(default)]
    pub party_ids: Vec<PartyId>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub security: Option<SecurityConfig>,
}

// =============================================================================
// LEGS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LegLabel {
    Request,
    Reply,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    #[serde(default)]
    pub address: Option<String>,
}

/// How receipts and errors are returned to the sender.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyPattern {
    #[default]
    Response,
    Callback,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptConfig {
    #[serde(default)]
    pub pattern: ReplyPattern,
    /// Callback address, required for the callback pattern.
    #[serde(default)]
    pub to: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorHandlingConfig {
    #[serde(default)]
    pub pattern: Option<ReplyPattern>,
    #[serde(default)]
    pub receiver_errors_to: Option<String>,
    #[serde(default)]
    pub notify_business_application: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessInfo {
    #[serde(default)]
    pub service: Option<Service>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub mpc: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMessageFlow {
    #[serde(default)]
    pub business_info: Option<BusinessInfo>,
}

/// Settings for Pull Requests on one (sub-)channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestFlow {
    #[serde(default)]
    pub mpc: Option<String>,
    #[serde(default)]
    pub security: Option<SecurityConfig>,
}

impl PullRequestFlow {
    /// The declared MPC, ignoring blank values.
    pub fn declared_mpc(&self) -> Option<&str> {
        self.mpc.as_deref().filter(|m| !m.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leg {
    #[serde(default)]
    pub label: Option<LegLabel>,
    #[serde(default)]
    pub protocol: Option<ProtocolConfig>,
    #[serde(default)]
    pub user_message_flow: Option<UserMessageFlow>,
    #[serde(default)]
    pub pull_request_flows: Vec<PullRequestFlow>,
    #[serde(default)]
    pub receipt: Option<ReceiptConfig>,
    #[serde(default)]
    pub error_handling: Option<ErrorHandlingConfig>,
}

impl Leg {
    /// Address messages on this leg are sent to, if this side sends.
    pub fn send_address(&self) -> Option<&str> {
        self.protocol
            .as_ref()
            .and_then(|p| p.address.as_deref())
            .filter(|a| !a.trim().is_empty())
    }

    pub fn business_info(&self) -> Option<&BusinessInfo> {
        self.user_message_flow
            .as_ref()
            .and_then(|f| f.business_info.as_ref())
    }

    /// The main MPC of the leg, ignoring blank values.
    pub fn main_mpc(&self) -> Option<&str> {
        self.business_info()
            .and_then(|bi| bi.mpc.as_deref())
            .filter(|m| !m.trim().is_empty())
    }
}

// =============================================================================
// PROCESSING MODE
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingMode {
    /// Unique id; an empty id is replaced by a generated one on admission.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub agreement: Option<Agreement>,
    #[serde(default)]
    pub mep: String,
    #[serde(default)]
    pub mep_binding: String,
    #[serde(default)]
    pub initiator: Option<TradingPartnerConfig>,
    #[serde(default)]
    pub responder: Option<TradingPartnerConfig>,
    #[serde(default)]
    pub legs: Vec<Leg>,
}

impl ProcessingMode {
    pub fn mep(&self) -> Option<Mep> {
        Mep::from_uri(&self.mep)
    }

    pub fn mep_binding(&self) -> Option<MepBinding> {
        MepBinding::from_uri(&self.mep_binding)
    }

    pub fn has_id(&self) -> bool {
        !is_blank(Some(self.id.as_str()))
    }

    /// The leg carrying the first (request) message of the exchange.
    pub fn first_leg(&self) -> Option<&Leg> {
        self.legs
            .iter()
            .find(|l| l.label == Some(LegLabel::Request))
            .or_else(|| self.legs.first())
    }

    /// True when this engine starts the exchange, i.e. the first leg tells
    /// it where to send or pull.
    pub fn is_engine_initiator(&self) -> bool {
        self.first_leg()
            .and_then(|leg| leg.send_address())
            .is_some()
    }

    pub fn is_one_way_push(&self) -> bool {
        self.mep_binding() == Some(MepBinding::Push)
    }

    pub fn is_one_way_pull(&self) -> bool {
        self.mep_binding() == Some(MepBinding::Pull)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mep_parses_uri_and_local_name() {
        assert_eq!(Mep::from_uri(&Mep::OneWay.uri()), Some(Mep::OneWay));
        assert_eq!(Mep::from_uri("twoWay"), Some(Mep::TwoWay));
        assert_eq!(Mep::from_uri("threeWay"), None);
        assert_eq!(Mep::from_uri(""), None);
    }

    #[test]
    fn test_binding_parses_and_maps_to_mep() {
        for binding in [
            MepBinding::Push,
            MepBinding::Pull,
            MepBinding::PushPush,
            MepBinding::PushPull,
            MepBinding::PullPush,
            MepBinding::PullPull,
        ] {
            assert_eq!(MepBinding::from_uri(&binding.uri()), Some(binding));
        }
        assert_eq!(MepBinding::Pull.mep(), Mep::OneWay);
        assert_eq!(MepBinding::PullPush.mep(), Mep::TwoWay);
        assert_eq!(MepBinding::from_uri("sync"), None);
    }

    #[test]
    fn test_engine_initiator_follows_send_address() {
        let mut pmode = ProcessingMode {
            legs: vec![Leg::default()],
            ..Default::default()
        };
        assert!(!pmode.is_engine_initiator());

        pmode.legs[0].protocol = Some(ProtocolConfig {
            address: Some("   ".into()),
        });
        assert!(!pmode.is_engine_initiator());

        pmode.legs[0].protocol = Some(ProtocolConfig {
            address: Some("https://partner.example/as4".into()),
        });
        assert!(pmode.is_engine_initiator());
    }

    #[test]
    fn test_first_leg_prefers_request_label() {
        let pmode = ProcessingMode {
            legs: vec![
                Leg {
                    label: Some(LegLabel::Reply),
                    ..Default::default()
                },
                Leg {
                    label: Some(LegLabel::Request),
                    protocol: Some(ProtocolConfig {
                        address: Some("https://b.example".into()),
                    }),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        assert_eq!(pmode.first_leg().and_then(|l| l.label), Some(LegLabel::Request));
        assert!(pmode.is_engine_initiator());
    }

    #[test]
    fn test_deserializes_from_json() {
        let json = r#"{
            "id": "pm-push",
            "mep": "oneWay",
            "mep_binding": "push",
            "initiator": { "party_ids": [{ "id": "A", "type": "urn:t" }], "role": "Seller" },
            "legs": [{
                "user_message_flow": { "business_info": { "action": "Order", "mpc": "urn:mpc" } }
            }]
        }"#;
        let pmode: ProcessingMode = serde_json::from_str(json).unwrap();
        assert_eq!(pmode.mep(), Some(Mep::OneWay));
        assert!(pmode.is_one_way_push());
        assert_eq!(pmode.legs[0].main_mpc(), Some("urn:mpc"));
        assert_eq!(
            pmode.initiator.unwrap().party_ids[0].party_type.as_deref(),
            Some("urn:t")
        );
    }
}
