//! # Off-chain Integrity Validator
//!
//! Two independent checks on a decoded claim, both always run:
//!
//! 1. **Hash check.** `"0x" + keccak256(canonical({data, token}))` must equal
//!    the claimed `packedData` (hex digits compared case-insensitively).
//! 2. **Signature check.** The EIP-191 signer of `packedData`, recovered
//!    from `signature`, must equal the claimed `subject`. The signed message
//!    is the `packedData` text or the bytes it encodes, per
//!    [`SignedMessage`].
//!
//! An unparseable signature is reported under `signature`. An unparseable
//! `subject` cannot equal any recovered address and is reported as a
//! `subject` mismatch.

use shv_core::claim::{FIELD_PACKED_DATA, FIELD_SIGNATURE, FIELD_SUBJECT};
use shv_core::{hex_eq, CanonicalizationError, EthAddress, ShareClaim, ValidationError};
use shv_crypto::{recover_signer, RecoverableSignature};

use crate::options::SignedMessage;

/// Run both integrity checks against a text-signed `packedData`.
pub fn validate_offchain(claim: &ShareClaim) -> Result<Vec<ValidationError>, CanonicalizationError> {
    validate_offchain_with(claim, SignedMessage::Text)
}

/// Run both integrity checks. Returns 0, 1 or 2 errors.
///
/// Only a serialization failure of the signed content is an `Err`.
pub fn validate_offchain_with(
    claim: &ShareClaim,
    message: SignedMessage,
) -> Result<Vec<ValidationError>, CanonicalizationError> {
    let mut errors = Vec::new();

    let recomputed = claim.content_digest()?.to_prefixed_hex();
    if !hex_eq(&claim.packed_data, &recomputed) {
        errors.push(ValidationError::new(
            FIELD_PACKED_DATA,
            format!(
                "claimed packedData {} does not match recomputed content hash {recomputed}",
                claim.packed_data
            ),
        ));
    }

    if let Some(error) = check_signature(claim, message) {
        errors.push(error);
    }
    Ok(errors)
}

fn check_signature(claim: &ShareClaim, mode: SignedMessage) -> Option<ValidationError> {
    let Some(message) = mode.message_bytes(&claim.packed_data) else {
        return Some(ValidationError::new(
            FIELD_SIGNATURE,
            format!(
                "packedData {} is not hex, so no {mode} message can be recovered",
                claim.packed_data
            ),
        ));
    };
    let recovered = RecoverableSignature::from_hex(&claim.signature)
        .and_then(|sig| recover_signer(&message, &sig));
    let recovered = match recovered {
        Ok(address) => address,
        Err(e) => {
            return Some(ValidationError::new(
                FIELD_SIGNATURE,
                format!("cannot recover signer from signature: {e}"),
            ))
        }
    };

    match EthAddress::from_hex(&claim.subject) {
        Ok(subject) if subject == recovered => None,
        _ => Some(ValidationError::new(
            FIELD_SUBJECT,
            format!(
                "claimed subject {} does not match recovered signer {recovered}",
                claim.subject
            ),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use shv_crypto::Secp256k1KeyPair;

    const KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    fn signed_claim(key: &Secp256k1KeyPair, subject: &str) -> ShareClaim {
        let mut raw = json!({
            "token": "tok-1",
            "subject": subject,
            "data": [{"layer2Hash": "0x01", "attester": "0x02", "tx": "0x03", "payload": {"b": 1, "a": 2}}],
            "packedData": "",
            "signature": ""
        });
        let unsigned = ShareClaim::from_value(&raw).unwrap();
        let packed = unsigned.content_digest().unwrap().to_prefixed_hex();
        let signature = key.sign_message(packed.as_bytes()).unwrap().to_hex();
        raw["packedData"] = Value::String(packed);
        raw["signature"] = Value::String(signature);
        ShareClaim::from_value(&raw).unwrap()
    }

    fn keys(errors: &[ValidationError]) -> Vec<&str> {
        errors.iter().map(|e| e.key.as_str()).collect()
    }

    #[test]
    fn authentic_claim_has_no_errors() {
        let key = Secp256k1KeyPair::from_hex(KEY).unwrap();
        let claim = signed_claim(&key, &key.address().to_checksum());
        assert!(validate_offchain(&claim).unwrap().is_empty());
    }

    #[test]
    fn subject_and_packed_data_compare_case_insensitively() {
        let key = Secp256k1KeyPair::from_hex(KEY).unwrap();
        let mut claim = signed_claim(&key, &key.address().to_lower_hex());
        assert!(validate_offchain(&claim).unwrap().is_empty());

        // Re-sign the uppercased text so only the hash comparison is exercised.
        claim.packed_data = format!("0x{}", claim.packed_data[2..].to_uppercase());
        claim.signature = key.sign_message(claim.packed_data.as_bytes()).unwrap().to_hex();
        assert!(validate_offchain(&claim).unwrap().is_empty());
    }

    #[test]
    fn tampered_token_is_packed_data_error() {
        let key = Secp256k1KeyPair::from_hex(KEY).unwrap();
        let mut claim = signed_claim(&key, &key.address().to_checksum());
        claim.token = "tok-2".into();
        let errors = validate_offchain(&claim).unwrap();
        assert_eq!(keys(&errors), ["packedData"]);
        assert!(errors[0].message.contains(&claim.packed_data));
        assert!(errors[0].message.contains("0x"));
    }

    #[test]
    fn wrong_subject_names_both_addresses() {
        let key = Secp256k1KeyPair::from_hex(KEY).unwrap();
        let other = Secp256k1KeyPair::generate().address().to_checksum();
        let claim = signed_claim(&key, &other);
        let errors = validate_offchain(&claim).unwrap();
        assert_eq!(keys(&errors), ["subject"]);
        assert!(errors[0].message.contains(&other));
        assert!(errors[0].message.contains(&key.address().to_checksum()));
    }

    #[test]
    fn unparseable_subject_is_subject_mismatch() {
        let key = Secp256k1KeyPair::from_hex(KEY).unwrap();
        let claim = signed_claim(&key, "alice");
        assert_eq!(keys(&validate_offchain(&claim).unwrap()), ["subject"]);
    }

    #[test]
    fn malformed_signature_is_signature_error() {
        let key = Secp256k1KeyPair::from_hex(KEY).unwrap();
        let mut claim = signed_claim(&key, &key.address().to_checksum());
        claim.signature = "0xdeadbeef".into();
        assert_eq!(keys(&validate_offchain(&claim).unwrap()), ["signature"]);
    }

    #[test]
    fn hash_bytes_signature_needs_hash_bytes_mode() {
        let key = Secp256k1KeyPair::from_hex(KEY).unwrap();
        let mut claim = signed_claim(&key, &key.address().to_checksum());
        let digest = hex::decode(&claim.packed_data[2..]).unwrap();
        claim.signature = key.sign_message(&digest).unwrap().to_hex();

        assert!(validate_offchain_with(&claim, SignedMessage::HashBytes)
            .unwrap()
            .is_empty());
        assert_eq!(keys(&validate_offchain(&claim).unwrap()), ["subject"]);
    }

    #[test]
    fn non_hex_packed_data_in_hash_bytes_mode() {
        let key = Secp256k1KeyPair::from_hex(KEY).unwrap();
        let mut claim = signed_claim(&key, &key.address().to_checksum());
        claim.packed_data = "0xnothex".into();
        let errors = validate_offchain_with(&claim, SignedMessage::HashBytes).unwrap();
        assert_eq!(keys(&errors), ["packedData", "signature"]);
    }

    #[test]
    fn both_checks_run_independently() {
        let key = Secp256k1KeyPair::from_hex(KEY).unwrap();
        let other = Secp256k1KeyPair::generate().address().to_checksum();
        let mut claim = signed_claim(&key, &other);
        claim.token = "changed".into();
        assert_eq!(keys(&validate_offchain(&claim).unwrap()), ["packedData", "subject"]);
    }
}
