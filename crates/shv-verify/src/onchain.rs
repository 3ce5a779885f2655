//! # On-chain Cross-Validator
//!
//! Reconciles each data node with the events its ledger transaction emitted.
//! For every node, in order:
//!
//! 1. Find an event named `event_name` whose `hash_field` equals the node's
//!    `layer2Hash`. If none exists the node gets one error keyed by the event
//!    name and no further checks.
//! 2. The event's `subject` must equal the claim's `subject`.
//! 3. The event's `attester` must equal the node's `attester`.
//!
//! All nodes are checked; errors are concatenated in node order. Logs are
//! looked up by each node's own transaction id, never by position.

use std::collections::BTreeMap;

use shv_core::claim::{FIELD_SUBJECT, NODE_ATTESTER};
use shv_core::{DataNode, ShareClaim, TxId, ValidationError};
use shv_ledger::{DecodedLogEvent, DecodedValue};

use crate::options::{OnchainOptions, EVENT_ATTESTER_FIELD, EVENT_SUBJECT_FIELD};

/// Cross-validate every node of `claim` against `logs`.
///
/// A node whose transaction is absent from `logs` is treated as having
/// emitted no events.
pub fn cross_validate(
    claim: &ShareClaim,
    logs: &BTreeMap<TxId, Vec<DecodedLogEvent>>,
    options: &OnchainOptions,
) -> Vec<ValidationError> {
    claim
        .data
        .iter()
        .flat_map(|node| {
            let events = logs.get(node.tx()).map(Vec::as_slice).unwrap_or_default();
            validate_node(&claim.subject, node, events, options)
        })
        .collect()
}

fn validate_node(
    subject: &str,
    node: &DataNode,
    events: &[DecodedLogEvent],
    options: &OnchainOptions,
) -> Vec<ValidationError> {
    let matched = events.iter().find(|event| {
        event.name == options.event_name
            && event
                .field(&options.hash_field)
                .is_some_and(|v| v.matches(node.layer2_hash()))
    });
    let Some(event) = matched else {
        return vec![ValidationError::new(
            options.event_name.as_str(),
            format!(
                "no {} event with {} {} in transaction {}",
                options.event_name,
                options.hash_field,
                node.layer2_hash(),
                node.tx()
            ),
        )];
    };

    let mut errors = Vec::new();
    if let Some(message) = compare(event.field(EVENT_SUBJECT_FIELD), subject, "subject") {
        errors.push(ValidationError::new(FIELD_SUBJECT, message));
    }
    if let Some(message) = compare(event.field(EVENT_ATTESTER_FIELD), node.attester(), "attester") {
        errors.push(ValidationError::new(NODE_ATTESTER, message));
    }
    errors
}

fn compare(on_chain: Option<&DecodedValue>, claimed: &str, what: &str) -> Option<String> {
    match on_chain {
        Some(value) if value.matches(claimed) => None,
        Some(value) => Some(format!("on-chain {what} {value} does not match claimed {claimed}")),
        None => Some(format!("on-chain event has no {what} field; claimed {claimed}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use url::Url;

    const SUBJECT: &str = "0x2c7536E3605D9C16a7a3D7b1898e529396a65c23";
    const ATTESTER: &str = "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf";

    fn options() -> OnchainOptions {
        OnchainOptions::new(Url::parse("http://ledger.invalid").unwrap())
    }

    fn claim(nodes: serde_json::Value) -> ShareClaim {
        ShareClaim::from_value(&json!({
            "token": "t",
            "subject": SUBJECT,
            "data": nodes,
            "packedData": "0x",
            "signature": "0x"
        }))
        .unwrap()
    }

    fn attested(hash: &str, subject: &str, attester: &str) -> DecodedLogEvent {
        DecodedLogEvent::new("TraitAttested")
            .with_field("layer2Hash", DecodedValue::Text(hash.into()))
            .with_field("subject", DecodedValue::Text(subject.into()))
            .with_field("attester", DecodedValue::Text(attester.into()))
    }

    fn keys(errors: &[ValidationError]) -> Vec<&str> {
        errors.iter().map(|e| e.key.as_str()).collect()
    }

    #[test]
    fn matching_event_passes() {
        let claim = claim(json!([{"layer2Hash": "0xAA", "attester": ATTESTER, "tx": "0x1"}]));
        let logs = BTreeMap::from([(
            TxId::new("0x1"),
            vec![
                DecodedLogEvent::new("Transfer"),
                attested("0xaa", &SUBJECT.to_lowercase(), &ATTESTER.to_lowercase()),
            ],
        )]);
        assert!(cross_validate(&claim, &logs, &options()).is_empty());
    }

    #[test]
    fn missing_event_skips_field_checks() {
        let claim = claim(json!([{"layer2Hash": "0xaa", "attester": ATTESTER, "tx": "0x1"}]));
        let logs = BTreeMap::from([(TxId::new("0x1"), vec![attested("0xbb", "0x0", "0x0")])]);
        let errors = cross_validate(&claim, &logs, &options());
        assert_eq!(keys(&errors), ["TraitAttested"]);
        assert!(errors[0].message.contains("0xaa"));
    }

    #[test]
    fn wrong_event_name_does_not_match() {
        let claim = claim(json!([{"layer2Hash": "0xaa", "attester": ATTESTER, "tx": "0x1"}]));
        let event = DecodedLogEvent::new("OtherEvent")
            .with_field("layer2Hash", DecodedValue::Text("0xaa".into()));
        let logs = BTreeMap::from([(TxId::new("0x1"), vec![event])]);
        assert_eq!(keys(&cross_validate(&claim, &logs, &options())), ["TraitAttested"]);
    }

    #[test]
    fn attester_mismatch_only() {
        let claim = claim(json!([{"layer2Hash": "0xaa", "attester": ATTESTER, "tx": "0x1"}]));
        let logs = BTreeMap::from([(TxId::new("0x1"), vec![attested("0xaa", SUBJECT, SUBJECT)])]);
        let errors = cross_validate(&claim, &logs, &options());
        assert_eq!(keys(&errors), ["attester"]);
        assert!(errors[0].message.contains(ATTESTER));
    }

    #[test]
    fn subject_and_attester_mismatch() {
        let claim = claim(json!([{"layer2Hash": "0xaa", "attester": ATTESTER, "tx": "0x1"}]));
        let logs = BTreeMap::from([(TxId::new("0x1"), vec![attested("0xaa", ATTESTER, SUBJECT)])]);
        assert_eq!(keys(&cross_validate(&claim, &logs, &options())), ["subject", "attester"]);
    }

    #[test]
    fn all_nodes_checked_in_order() {
        let claim = claim(json!([
            {"layer2Hash": "0x01", "attester": ATTESTER, "tx": "0x1"},
            {"layer2Hash": "0x02", "attester": ATTESTER, "tx": "0x2"},
            {"layer2Hash": "0x03", "attester": ATTESTER, "tx": "0x3"}
        ]));
        let logs = BTreeMap::from([
            (TxId::new("0x1"), vec![]),
            (TxId::new("0x2"), vec![attested("0x02", SUBJECT, ATTESTER)]),
            (TxId::new("0x3"), vec![attested("0x03", SUBJECT, SUBJECT)]),
        ]);
        let errors = cross_validate(&claim, &logs, &options());
        assert_eq!(keys(&errors), ["TraitAttested", "attester"]);
    }

    #[test]
    fn configurable_hash_field() {
        let claim = claim(json!([{"layer2Hash": "0xaa", "attester": ATTESTER, "tx": "0x1"}]));
        let event = DecodedLogEvent::new("TraitAttested")
            .with_field("dataHash", DecodedValue::FixedBytes(vec![0xaa]))
            .with_field("subject", DecodedValue::Text(SUBJECT.into()))
            .with_field("attester", DecodedValue::Text(ATTESTER.into()));
        let logs = BTreeMap::from([(TxId::new("0x1"), vec![event])]);
        assert_eq!(keys(&cross_validate(&claim, &logs, &options())), ["TraitAttested"]);
        let data_hash = options().with_hash_field("dataHash");
        assert!(cross_validate(&claim, &logs, &data_hash).is_empty());
    }

    #[test]
    fn missing_subject_field_is_mismatch() {
        let claim = claim(json!([{"layer2Hash": "0xaa", "attester": ATTESTER, "tx": "0x1"}]));
        let event = DecodedLogEvent::new("TraitAttested")
            .with_field("layer2Hash", DecodedValue::Text("0xaa".into()))
            .with_field("attester", DecodedValue::Text(ATTESTER.into()));
        let logs = BTreeMap::from([(TxId::new("0x1"), vec![event])]);
        assert_eq!(keys(&cross_validate(&claim, &logs, &options())), ["subject"]);
    }
}
