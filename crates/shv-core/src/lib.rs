//! # shv-core — Foundational Types for the Share Verification Gate
//!
//! This crate is the leaf of the workspace DAG. It defines the type-system
//! primitives every other crate builds on. It depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **`CanonicalValue` tagged tree.** Untyped JSON is canonicalized exactly
//!    once into an immutable tree whose mappings are key-sorted. No in-place
//!    mutation, no aliasing between input and output.
//!
//! 2. **`CanonicalBytes` newtype.** ALL content-hash computation flows through
//!    `CanonicalBytes`. No raw `serde_json::to_vec()` for digests. A signer
//!    canonicalized before signing, so hashing non-canonical bytes would
//!    silently break every signature check.
//!
//! 3. **`keccak256_digest()` accepts only `&CanonicalBytes`.** Compile-time
//!    enforcement that all content digests flow through canonicalization.
//!
//! 4. **Typed claim model.** `ShareClaim` and `DataNode` are decoded once at
//!    the boundary; validators never branch on untyped values.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `shv-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod claim;
pub mod digest;
pub mod error;
pub mod identity;
pub mod validation;

// Re-export primary types for ergonomic imports.
pub use canonical::{canonicalize, CanonicalBytes, CanonicalValue};
pub use claim::{DataNode, ShareClaim};
pub use digest::{keccak256_digest, ContentDigest, DigestAlgorithm};
pub use error::{CanonicalizationError, ClaimDecodeError, CryptoError};
pub use identity::{hex_eq, EthAddress, TxId};
pub use validation::ValidationError;
