//! End-to-end pipeline tests with real secp256k1 keys and an in-memory
//! ledger.
//!
//! Each claim is built the way a claimant builds one: canonicalize
//! `{data, token}`, hash it, sign the `0x` hash text as an EIP-191 personal
//! message. Ledger logs are served by `StaticLogSource`, with per-transaction
//! delays where completion order matters.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use shv_core::{EthAddress, ShareClaim};
use shv_crypto::Secp256k1KeyPair;
use shv_ledger::{DecodedLogEvent, DecodedValue, LedgerError, StaticLogSource};
use shv_verify::{
    SchemaPayloadValidator, SignedMessage, Stage, Verdict, Verifier, VerifyError, VerifyOptions,
};
use url::Url;

const CLAIMANT_KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
const ATTESTER_KEY: &str = "0x0000000000000000000000000000000000000000000000000000000000000001";

// -- Fixtures ----------------------------------------------------------------

fn claimant() -> Secp256k1KeyPair {
    Secp256k1KeyPair::from_hex(CLAIMANT_KEY).unwrap()
}

fn attester() -> EthAddress {
    Secp256k1KeyPair::from_hex(ATTESTER_KEY).unwrap().address()
}

fn layer2_hash(i: usize) -> String {
    format!("0x{}", format!("{:02x}", i + 1).repeat(32))
}

fn tx_id(i: usize) -> String {
    format!("0x{}", format!("{:02x}", 0xa0 + i).repeat(32))
}

fn node(i: usize) -> Value {
    json!({
        "layer2Hash": layer2_hash(i),
        "attester": attester().to_checksum(),
        "tx": tx_id(i),
        "payload": {"trait": format!("trait-{i}"), "score": i, "meta": {"z": true, "a": null}}
    })
}

/// A claim over `nodes`, signed by `signer`, claiming `subject`.
fn signed_claim(signer: &Secp256k1KeyPair, subject: &EthAddress, nodes: Vec<Value>) -> Value {
    let mut raw = json!({
        "token": "share-7f3a",
        "subject": subject.to_checksum(),
        "data": nodes,
        "packedData": "",
        "signature": ""
    });
    let packed = ShareClaim::from_value(&raw)
        .unwrap()
        .content_digest()
        .unwrap()
        .to_prefixed_hex();
    raw["signature"] = Value::String(signer.sign_message(packed.as_bytes()).unwrap().to_hex());
    raw["packedData"] = Value::String(packed);
    raw
}

fn valid_claim(nodes: usize) -> Value {
    let key = claimant();
    signed_claim(&key, &key.address(), (0..nodes).map(node).collect())
}

fn attested(hash: &str, subject: EthAddress, attester: EthAddress) -> DecodedLogEvent {
    let bytes = hex::decode(hash.trim_start_matches("0x")).unwrap();
    DecodedLogEvent::new("TraitAttested")
        .with_field("subject", DecodedValue::Address(subject))
        .with_field("attester", DecodedValue::Address(attester))
        .with_field("layer2Hash", DecodedValue::FixedBytes(bytes))
}

/// A ledger holding one matching attestation per node.
fn honest_ledger(nodes: usize) -> StaticLogSource {
    (0..nodes).fold(StaticLogSource::new(), |src, i| {
        src.with_logs(
            &tx_id(i),
            vec![attested(&layer2_hash(i), claimant().address(), attester())],
        )
    })
}

fn onchain_options() -> VerifyOptions {
    VerifyOptions::with_onchain(Url::parse("http://ledger.test:8545").unwrap())
}

fn keys(verdict: &Verdict) -> Vec<&str> {
    verdict.errors().iter().map(|e| e.key.as_str()).collect()
}

// -- Valid claims ----------------------------------------------------------

#[tokio::test]
async fn valid_claim_is_accepted_with_token() {
    let ledger = Arc::new(honest_ledger(3));
    let verifier = Verifier::new(onchain_options(), ledger.clone());

    let verdict = verifier.verify(&valid_claim(3)).await.unwrap();
    assert_eq!(
        verdict,
        Verdict::Accepted {
            token: "share-7f3a".into()
        }
    );
    assert_eq!(ledger.fetch_count(), 3);
}

#[tokio::test]
async fn valid_claim_accepted_offchain_only_without_ledger() {
    let ledger = Arc::new(StaticLogSource::new());
    let verifier = Verifier::new(VerifyOptions::offchain_only(), ledger.clone());

    assert!(verifier.verify(&valid_claim(2)).await.unwrap().is_accepted());
    assert_eq!(ledger.fetch_count(), 0);
}

#[tokio::test]
async fn hash_bytes_signer_accepted_in_hash_bytes_mode() {
    let key = claimant();
    let mut claim = valid_claim(2);
    let packed = claim["packedData"].as_str().unwrap().to_string();
    let digest = hex::decode(&packed[2..]).unwrap();
    claim["signature"] = Value::String(key.sign_message(&digest).unwrap().to_hex());

    let verifier = Verifier::new(
        onchain_options().with_signed_message(SignedMessage::HashBytes),
        Arc::new(honest_ledger(2)),
    );
    assert!(verifier.verify(&claim).await.unwrap().is_accepted());

    let text_mode = Verifier::new(onchain_options(), Arc::new(honest_ledger(2)));
    let verdict = text_mode.verify(&claim).await.unwrap();
    assert_eq!(verdict.stage(), Some(Stage::Offchain));
    assert_eq!(keys(&verdict), ["subject"]);
}

#[tokio::test]
async fn key_order_of_request_does_not_matter() {
    let claim = valid_claim(1);
    // Rebuild node 0 with keys inserted in reverse order.
    let original = claim["data"][0].as_object().unwrap();
    let mut reversed = serde_json::Map::new();
    for (k, v) in original.iter().rev() {
        reversed.insert(k.clone(), v.clone());
    }
    let mut reordered = claim.clone();
    reordered["data"][0] = Value::Object(reversed);

    let verifier = Verifier::new(onchain_options(), Arc::new(honest_ledger(1)));
    assert!(verifier.verify(&reordered).await.unwrap().is_accepted());
}

// -- Off-chain rejections ----------------------------------------------------

#[tokio::test]
async fn tampered_packed_data_rejected_before_ledger() {
    let key = claimant();
    let mut claim = valid_claim(2);
    let packed = claim["packedData"].as_str().unwrap().to_string();
    let flipped = if packed.ends_with('0') { '1' } else { '0' };
    let tampered = format!("{}{flipped}", &packed[..packed.len() - 1]);
    // The claimant signed the tampered value, so only the content binding fails.
    claim["signature"] = Value::String(key.sign_message(tampered.as_bytes()).unwrap().to_hex());
    claim["packedData"] = Value::String(tampered.clone());

    let ledger = Arc::new(honest_ledger(2));
    let verdict = Verifier::new(onchain_options(), ledger.clone())
        .verify(&claim)
        .await
        .unwrap();

    assert_eq!(verdict.stage(), Some(Stage::Offchain));
    assert_eq!(keys(&verdict), ["packedData"]);
    assert!(verdict.errors()[0].message.contains(&tampered));
    assert!(verdict.errors()[0].message.contains(&packed));
    assert_eq!(ledger.fetch_count(), 0, "on-chain stage must not run");
}

#[tokio::test]
async fn wrong_subject_is_single_subject_error() {
    let signer = claimant();
    let impostor = Secp256k1KeyPair::generate().address();
    let claim = signed_claim(&signer, &impostor, vec![node(0)]);

    let verdict = Verifier::new(onchain_options(), Arc::new(honest_ledger(1)))
        .verify(&claim)
        .await
        .unwrap();

    assert_eq!(verdict.stage(), Some(Stage::Offchain));
    assert_eq!(keys(&verdict), ["subject"]);
    let message = &verdict.errors()[0].message;
    assert!(message.contains(&impostor.to_checksum()));
    assert!(message.contains(&signer.address().to_checksum()));
}

#[tokio::test]
async fn shape_errors_are_complete() {
    let claim = json!({"token": " ", "subject": 5, "data": [], "packedData": "0x1"});
    let verdict = Verifier::new(onchain_options(), Arc::new(StaticLogSource::new()))
        .verify(&claim)
        .await
        .unwrap();
    assert_eq!(verdict.stage(), Some(Stage::Shape));
    assert_eq!(keys(&verdict), ["token", "subject", "data", "signature"]);
}

// -- Payload stage -----------------------------------------------------------

#[tokio::test]
async fn payload_failures_reported_for_every_node() {
    let schema = json!({
        "type": "object",
        "properties": {"payload": {"properties": {"score": {"maximum": 0}}}}
    });
    let ledger = Arc::new(honest_ledger(3));
    let verifier = Verifier::new(onchain_options(), ledger.clone())
        .with_payload_validator(Arc::new(SchemaPayloadValidator::new(&schema).unwrap()));

    let verdict = verifier.verify(&valid_claim(3)).await.unwrap();
    assert_eq!(verdict.stage(), Some(Stage::Payload));
    assert_eq!(keys(&verdict), ["data[1]/payload/score", "data[2]/payload/score"]);
    assert_eq!(ledger.fetch_count(), 0);
}

// -- On-chain rejections -----------------------------------------------------

#[tokio::test]
async fn missing_event_names_hash_without_field_errors() {
    let ledger = StaticLogSource::new()
        .with_logs(&tx_id(0), vec![attested(&layer2_hash(0), claimant().address(), attester())])
        .with_logs(&tx_id(1), vec![DecodedLogEvent::new("Transfer")]);
    let verdict = Verifier::new(onchain_options(), Arc::new(ledger))
        .verify(&valid_claim(2))
        .await
        .unwrap();

    assert_eq!(verdict.stage(), Some(Stage::Onchain));
    assert_eq!(keys(&verdict), ["TraitAttested"]);
    assert!(verdict.errors()[0].message.contains(&layer2_hash(1)));
}

#[tokio::test]
async fn attester_mismatch_is_single_attester_error() {
    let other_attester = Secp256k1KeyPair::generate().address();
    let ledger = StaticLogSource::new().with_logs(
        &tx_id(0),
        vec![attested(&layer2_hash(0), claimant().address(), other_attester)],
    );
    let verdict = Verifier::new(onchain_options(), Arc::new(ledger))
        .verify(&valid_claim(1))
        .await
        .unwrap();

    assert_eq!(verdict.stage(), Some(Stage::Onchain));
    assert_eq!(keys(&verdict), ["attester"]);
}

#[tokio::test]
async fn onchain_errors_accumulate_across_nodes() {
    let stranger = Secp256k1KeyPair::generate().address();
    let ledger = StaticLogSource::new()
        .with_logs(&tx_id(0), vec![])
        .with_logs(&tx_id(1), vec![attested(&layer2_hash(1), stranger, attester())])
        .with_logs(&tx_id(2), vec![attested(&layer2_hash(2), claimant().address(), stranger)]);
    let verdict = Verifier::new(onchain_options(), Arc::new(ledger))
        .verify(&valid_claim(3))
        .await
        .unwrap();
    assert_eq!(keys(&verdict), ["TraitAttested", "subject", "attester"]);
}

// -- Concurrency -------------------------------------------------------------

#[tokio::test]
async fn out_of_order_completion_is_keyed_by_transaction() {
    const N: usize = 5;
    // Earlier nodes answer later: completion order is the reverse of node order.
    let ledger = (0..N).fold(honest_ledger(N), |src, i| {
        src.with_delay(&tx_id(i), Duration::from_millis(10 * (N - i) as u64))
    });
    let verifier = Verifier::new(onchain_options(), Arc::new(ledger));
    assert!(verifier.verify(&valid_claim(N)).await.unwrap().is_accepted());

    // Swap one transaction's attestation onto another hash: only that node fails.
    let ledger = (0..N)
        .fold(honest_ledger(N), |src, i| {
            src.with_delay(&tx_id(i), Duration::from_millis(10 * (N - i) as u64))
        })
        .with_logs(&tx_id(3), vec![attested(&layer2_hash(1), claimant().address(), attester())]);
    let verdict = Verifier::new(onchain_options(), Arc::new(ledger))
        .verify(&valid_claim(N))
        .await
        .unwrap();
    assert_eq!(keys(&verdict), ["TraitAttested"]);
    assert!(verdict.errors()[0].message.contains(&layer2_hash(3)));
}

#[tokio::test]
async fn shared_transaction_is_fetched_once() {
    let mut nodes: Vec<Value> = (0..3).map(node).collect();
    for n in &mut nodes {
        n["tx"] = Value::String(tx_id(0).to_uppercase().replacen("0X", "0x", 1));
    }
    let key = claimant();
    let claim = signed_claim(&key, &key.address(), nodes);
    let events = (0..3)
        .map(|i| attested(&layer2_hash(i), key.address(), attester()))
        .collect();
    let ledger = Arc::new(StaticLogSource::new().with_logs(&tx_id(0), events));

    let verdict = Verifier::new(onchain_options(), ledger.clone())
        .verify(&claim)
        .await
        .unwrap();
    assert!(verdict.is_accepted());
    assert_eq!(ledger.fetch_count(), 1);
}

#[tokio::test]
async fn concurrent_runs_share_one_verifier() {
    let verifier = Arc::new(Verifier::new(onchain_options(), Arc::new(honest_ledger(2))));
    let good = valid_claim(2);
    let key = claimant();
    let bad = signed_claim(&key, &attester(), vec![node(0), node(1)]);

    let (a, b) = tokio::join!(verifier.verify(&good), verifier.verify(&bad));
    assert!(a.unwrap().is_accepted());
    assert_eq!(keys(&b.unwrap()), ["subject"]);
}

// -- Infrastructure failures -------------------------------------------------

#[tokio::test]
async fn single_lookup_failure_aborts_run() {
    let ledger = honest_ledger(3).with_failure(&tx_id(1), "provider timeout");
    let result = Verifier::new(onchain_options(), Arc::new(ledger))
        .verify(&valid_claim(3))
        .await;

    match result {
        Err(VerifyError::Ledger { tx, source }) => {
            assert_eq!(tx.as_str(), tx_id(1));
            assert!(matches!(source, LedgerError::Unavailable(_)));
        }
        other => panic!("expected ledger failure, got {other:?}"),
    }
}

#[tokio::test]
async fn unknown_transaction_is_failure_not_rejection() {
    let ledger = StaticLogSource::new()
        .with_logs(&tx_id(0), vec![attested(&layer2_hash(0), claimant().address(), attester())]);
    let result = Verifier::new(onchain_options(), Arc::new(ledger))
        .verify(&valid_claim(2))
        .await;
    assert!(matches!(
        result,
        Err(VerifyError::Ledger {
            source: LedgerError::TransactionNotFound(_),
            ..
        })
    ));
}
