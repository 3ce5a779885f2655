//! # Keccak-256 over Raw Bytes
//!
//! Content digests of claims go through `shv_core::keccak256_digest`, which
//! only accepts canonical bytes. This function is for fixed protocol
//! framings that are hashed as-is.

use sha3::{Digest, Keccak256};

/// Keccak-256 of `input`.
pub fn keccak256(input: &[u8]) -> [u8; 32] {
    let hash = Keccak256::digest(input);
    let mut out = [0u8; 32];
    out.copy_from_slice(&hash);
    out
}
