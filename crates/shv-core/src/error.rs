//! # Error Types — Structured Error Hierarchy
//!
//! All errors use `thiserror` for derive-based `Display` and `Error`
//! implementations.
//!
//! These are *infrastructure* errors. A claim that fails a check is not an
//! error in this sense; it produces [`ValidationError`](crate::ValidationError)
//! values instead.

use thiserror::Error;

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// A raw claim did not match the shape the typed model requires.
///
/// The request shape validator reports these conditions as validation
/// errors first; reaching this error means decoding was attempted on an
/// unvalidated claim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClaimDecodeError {
    /// The claim root is not a JSON object.
    #[error("claim must be a JSON object")]
    NotAnObject,

    /// A required string field is missing or not a string.
    #[error("field '{0}' is missing or not a string")]
    MissingString(String),

    /// The `data` field is missing or not an array.
    #[error("field 'data' is missing or not an array")]
    MissingData,

    /// A data node is not a JSON object.
    #[error("data[{0}] must be a JSON object")]
    NodeNotAnObject(usize),
}

/// Error in cryptographic operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// A signature could not be parsed.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// No public key could be recovered from the signature.
    #[error("signer recovery failed: {0}")]
    RecoveryFailed(String),

    /// An address could not be parsed.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Key generation or parsing failed.
    #[error("key error: {0}")]
    KeyError(String),
}
