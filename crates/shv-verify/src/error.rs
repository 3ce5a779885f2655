//! Errors that prevent a verification run from completing.
//!
//! None of these is a statement about the claim. A caller seeing
//! [`VerifyError`] must not treat the claim as rejected.

use shv_core::{CanonicalizationError, ClaimDecodeError, TxId};
use shv_ledger::LedgerError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VerifyError {
    /// A ledger lookup failed during the on-chain fan-out.
    #[error("ledger lookup for transaction {tx} failed: {source}")]
    Ledger {
        tx: TxId,
        #[source]
        source: LedgerError,
    },

    /// The signed content could not be serialized.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// A shape-validated claim failed to decode into the typed model.
    #[error("claim decode failed after shape validation: {0}")]
    ClaimDecode(#[from] ClaimDecodeError),
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid value for {var}: {reason}")]
    InvalidValue { var: String, reason: String },

    #[error("invalid event signature: {0}")]
    EventSignature(String),

    #[error("invalid payload schema: {0}")]
    PayloadSchema(String),

    #[error("on-chain verification is enabled but no ledger URL is configured")]
    MissingLedgerUrl,

    #[error("ledger client: {0}")]
    Ledger(#[from] LedgerError),
}
