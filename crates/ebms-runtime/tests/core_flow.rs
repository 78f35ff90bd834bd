//! A received User Message and a Pull Request travelling through the wired
//! core: P-Modes loaded from disk, matched, and the units moved through their
//! states.

use ebms_01_pmodes::{PModeManagementApi, PModeMatchingApi};
use ebms_02_message_units::{MessageUnitApi, NewMessageUnit, ProcessingState};
use ebms_runtime::{load_pmodes, Core, CoreConfig};
use shared_types::{
    AuthenticationEvidence, Direction, EvidenceScope, PartyId, PasswordType, Service,
    TradingPartner, UserMessageMetadata, UsernameTokenEvidence,
};

const RECEIVE_ORDERS: &str = r#"{
    "id": "receive-orders",
    "mep": "http://docs.oasis-open.org/ebxml-msg/ebms/v3.0/ns/core/200704/oneWay",
    "mep_binding": "http://docs.oasis-open.org/ebxml-msg/ebms/v3.0/ns/core/200704/push",
    "initiator": { "party_ids": [{ "id": "org:buyer" }], "role": "Buyer" },
    "responder": {
        "party_ids": [{ "id": "org:seller" }],
        "role": "Seller",
        "security": { "encryption": { "keystore_alias": "seller", "certificate_password": "s3cret" } }
    },
    "legs": [{
        "user_message_flow": {
            "business_info": { "service": { "name": "urn:orders" }, "action": "Submit" }
        }
    }]
}"#;

const SERVE_INVOICES: &str = r#"{
    "id": "serve-invoices",
    "mep": "oneWay",
    "mep_binding": "pull",
    "initiator": {
        "security": { "ebms_username_token": { "username": "buyer", "password": "pull-pw" } }
    },
    "legs": [{
        "user_message_flow": { "business_info": { "mpc": "urn:invoices" } }
    }]
}"#;

fn core_with_pmodes() -> Core {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("receive-orders.json"), RECEIVE_ORDERS).unwrap();
    std::fs::write(dir.path().join("serve-invoices.json"), SERVE_INVOICES).unwrap();

    let mut config = CoreConfig::default();
    config
        .apply_overrides(|name| match name {
            "EBMS_PRIVATE_KEYS" => Some("seller:s3cret".to_string()),
            "EBMS_HOST_ID" => Some("seller.example".to_string()),
            _ => None,
        })
        .unwrap();

    let core = Core::build(&config).unwrap();
    let summary = load_pmodes(&*core.pmode_manager, dir.path()).unwrap();
    assert!(summary.failed.is_empty(), "{:?}", summary.failed);
    assert_eq!(summary.loaded.len(), 2);
    core
}

#[test]
fn test_received_user_message_is_matched_and_delivered() {
    let core = core_with_pmodes();

    let mut metadata = UserMessageMetadata {
        message_id: "order-17@buyer.example".into(),
        sender: TradingPartner::new(vec![PartyId::new("org:buyer")], "Buyer"),
        receiver: TradingPartner::new(vec![PartyId::new("org:seller")], "Seller"),
        ..Default::default()
    };
    metadata.collaboration.service = Service::new("urn:orders");
    metadata.collaboration.action = Some("Submit".into());

    let pmode = core
        .pmode_matcher
        .find_for_received_user_message(&metadata)
        .unwrap();
    assert_eq!(pmode.id, "receive-orders");

    let unit = core
        .message_units
        .store_incoming(
            NewMessageUnit::user_message()
                .with_message_id(metadata.message_id.clone())
                .with_pmode_id(pmode.id.clone()),
        )
        .unwrap();
    let handle = unit.unit_ref();
    let units = &core.message_units;

    assert!(units.start_processing(&handle).unwrap());
    assert!(units.set_ready_for_delivery(&handle).unwrap());
    assert!(units.start_delivery(&handle).unwrap());
    assert!(!units.start_delivery(&handle).unwrap());
    assert!(units.set_delivered(&handle).unwrap());

    let stored = units.get(handle.key).unwrap().unwrap();
    let history: Vec<ProcessingState> = stored.states.entries().iter().map(|e| e.state).collect();
    assert_eq!(
        history,
        vec![
            ProcessingState::Received,
            ProcessingState::Processing,
            ProcessingState::ReadyForDelivery,
            ProcessingState::OutForDelivery,
            ProcessingState::Delivered,
        ]
    );
}

#[test]
fn test_pull_request_takes_waiting_message() {
    let core = core_with_pmodes();
    let units = &core.message_units;

    let submitted = units
        .store_outgoing(
            NewMessageUnit::user_message()
                .with_pmode_id("serve-invoices")
                .with_mpc("urn:invoices"),
        )
        .unwrap();
    assert!(submitted.message_id.ends_with("@seller.example"));
    assert!(units.set_awaiting_pull(&submitted.unit_ref()).unwrap());

    // Without credentials nothing is authorized
    let anonymous = core
        .pmode_matcher
        .find_for_pulling("urn:invoices", &AuthenticationEvidence::new());
    assert!(anonymous.is_empty());

    let evidence = AuthenticationEvidence::new().with_username_token(
        EvidenceScope::EbmsUsernameToken,
        UsernameTokenEvidence {
            username: "buyer".into(),
            password: Some("pull-pw".into()),
            password_type: PasswordType::Text,
        },
    );
    let authorized: Vec<String> = core
        .pmode_matcher
        .find_for_pulling("urn:invoices", &evidence)
        .iter()
        .map(|p| p.id.clone())
        .collect();
    assert_eq!(authorized, vec!["serve-invoices"]);

    let pulled = units.next_for_pulling(&authorized).unwrap().unwrap();
    assert_eq!(pulled.key, submitted.key);
    assert_eq!(pulled.current_state(), Some(ProcessingState::Processing));
    assert!(units.next_for_pulling(&authorized).unwrap().is_none());

    assert!(units.set_done(&pulled.unit_ref()).unwrap());
    assert_eq!(
        units
            .find_in_state(Direction::Out, &[ProcessingState::Done])
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn test_admin_changes_are_visible_to_matcher() {
    let core = core_with_pmodes();
    core.pmode_manager.remove("serve-invoices").unwrap();
    assert!(core.pmode_matcher.find_for_sending("serve-invoices").is_none());
    assert_eq!(core.pmode_manager.get_all().len(), 1);
}
