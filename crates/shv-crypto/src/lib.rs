//! # shv-crypto — Cryptographic Primitives
//!
//! Provides the primitives the verification pipeline treats as external:
//!
//! - **Keccak-256** over raw bytes, for protocol framings that are not
//!   canonical JSON (EIP-191 prefixes, public keys, event signatures).
//! - **secp256k1 signer recovery** for EIP-191 personal messages, yielding
//!   the signer's [`EthAddress`](shv_core::EthAddress).
//! - **Signing keys** used by the CLI to produce claims and by tests.
//!
//! ## Crate Policy
//!
//! - Depends only on `shv-core` internally.
//! - No mocking of cryptographic operations in tests — all tests use real
//!   Keccak-256 and real secp256k1.

pub mod keccak;
pub mod secp256k1;

pub use keccak::keccak256;
pub use secp256k1::{
    eip191_hash, recover_signer, RecoverableSignature, Secp256k1KeyPair,
};
