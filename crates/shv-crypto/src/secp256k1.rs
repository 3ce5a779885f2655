//! # secp256k1 Signer Recovery
//!
//! Recovers the address that produced an EIP-191 personal-message signature.
//!
//! ## Message Framing
//!
//! The caller chooses the message bytes; the verifier passes either the
//! `packedData` text or the digest bytes it encodes. Both are framed per
//! EIP-191 version `0x45`:
//!
//! ```text
//! keccak256("\x19Ethereum Signed Message:\n" ‖ decimal(len(msg)) ‖ msg)
//! ```
//!
//! ## Signature Encoding
//!
//! 65 bytes `r ‖ s ‖ v`, hex with optional `0x`. `v` may be `0`/`1` or the
//! legacy `27`/`28`. A high-`s` signature is normalized to low-`s` with the
//! recovery id flipped, which recovers the same key.
//!
//! ## Security Invariant
//!
//! Private keys are never serialized or logged. `Secp256k1KeyPair` does not
//! implement `Serialize` and its `Debug` output shows only the address.

use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use shv_core::identity::strip_hex_prefix;
use shv_core::{CryptoError, EthAddress};

use crate::keccak::keccak256;

const EIP191_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n";

/// EIP-191 personal-message hash of `message`.
pub fn eip191_hash(message: &[u8]) -> [u8; 32] {
    let len = message.len().to_string();
    let mut framed = Vec::with_capacity(EIP191_PREFIX.len() + len.len() + message.len());
    framed.extend_from_slice(EIP191_PREFIX);
    framed.extend_from_slice(len.as_bytes());
    framed.extend_from_slice(message);
    keccak256(&framed)
}

/// A parsed 65-byte recoverable signature.
#[derive(Clone, PartialEq, Eq)]
pub struct RecoverableSignature {
    signature: Signature,
    recovery_id: RecoveryId,
}

impl RecoverableSignature {
    /// Parse `r ‖ s ‖ v` from hex.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let digits = strip_hex_prefix(s.trim());
        if digits.len() != 130 {
            return Err(CryptoError::InvalidSignature(format!(
                "signature must be 130 hex digits, got {}",
                digits.len()
            )));
        }
        let mut bytes = [0u8; 65];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Parse `r ‖ s ‖ v` from raw bytes.
    pub fn from_bytes(bytes: &[u8; 65]) -> Result<Self, CryptoError> {
        let v = match bytes[64] {
            27 | 28 => bytes[64] - 27,
            0 | 1 => bytes[64],
            other => {
                return Err(CryptoError::InvalidSignature(format!(
                    "recovery byte must be 0, 1, 27 or 28, got {other}"
                )))
            }
        };
        let signature = Signature::from_slice(&bytes[..64])
            .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
        let recovery_id = RecoveryId::from_byte(v)
            .ok_or_else(|| CryptoError::InvalidSignature(format!("bad recovery id {v}")))?;

        Ok(match signature.normalize_s() {
            Some(low_s) => Self {
                signature: low_s,
                recovery_id: RecoveryId::new(
                    !recovery_id.is_y_odd(),
                    recovery_id.is_x_reduced(),
                ),
            },
            None => Self {
                signature,
                recovery_id,
            },
        })
    }

    /// Encode as `0x`-prefixed hex with legacy `v` (27/28).
    pub fn to_hex(&self) -> String {
        let mut bytes = [0u8; 65];
        bytes[..64].copy_from_slice(&self.signature.to_bytes());
        bytes[64] = 27 + self.recovery_id.to_byte();
        format!("0x{}", hex::encode(bytes))
    }
}

impl std::fmt::Debug for RecoverableSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let hex = self.to_hex();
        write!(f, "RecoverableSignature({}...)", &hex[..18])
    }
}

/// Recover the address that signed `message` as an EIP-191 personal message.
pub fn recover_signer(
    message: &[u8],
    signature: &RecoverableSignature,
) -> Result<EthAddress, CryptoError> {
    let prehash = eip191_hash(message);
    let key = VerifyingKey::recover_from_prehash(
        &prehash,
        &signature.signature,
        signature.recovery_id,
    )
    .map_err(|e| CryptoError::RecoveryFailed(e.to_string()))?;
    Ok(address_of(&key))
}

fn address_of(key: &VerifyingKey) -> EthAddress {
    let point = key.to_encoded_point(false);
    // Uncompressed SEC1: 0x04 ‖ X ‖ Y.
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hash[12..]);
    EthAddress::from_bytes(bytes)
}

/// A secp256k1 key pair for producing claim signatures.
pub struct Secp256k1KeyPair {
    signing_key: SigningKey,
}

impl Secp256k1KeyPair {
    /// Generate a new random key pair.
    pub fn generate() -> Self {
        let mut rng = rand::rngs::OsRng;
        Self {
            signing_key: SigningKey::random(&mut rng),
        }
    }

    /// Load a key pair from a 32-byte hex private key.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let digits = strip_hex_prefix(s.trim());
        let bytes = hex::decode(digits).map_err(|e| CryptoError::KeyError(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(CryptoError::KeyError(format!(
                "private key must be 32 bytes, got {}",
                bytes.len()
            )));
        }
        let signing_key =
            SigningKey::from_slice(&bytes).map_err(|e| CryptoError::KeyError(e.to_string()))?;
        Ok(Self { signing_key })
    }

    /// The address controlled by this key.
    pub fn address(&self) -> EthAddress {
        address_of(self.signing_key.verifying_key())
    }

    /// Sign `message` as an EIP-191 personal message.
    pub fn sign_message(&self, message: &[u8]) -> Result<RecoverableSignature, CryptoError> {
        let prehash = eip191_hash(message);
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(&prehash)
            .map_err(|e| CryptoError::KeyError(e.to_string()))?;
        Ok(RecoverableSignature {
            signature,
            recovery_id,
        })
    }
}

impl std::fmt::Debug for Secp256k1KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secp256k1KeyPair({})", self.address())
    }
}
