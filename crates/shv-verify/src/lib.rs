//! # shv-verify — Share Claim Verification Pipeline
//!
//! Decides whether a share claim is authentic with respect to what its
//! claimant signed, and consistent with the attestations committed on the
//! ledger.
//!
//! ## Stages
//!
//! | Stage      | Module       | Input                        | Error keys                          |
//! |------------|--------------|------------------------------|-------------------------------------|
//! | `shape`    | [`shape`]    | raw JSON                     | field names, `data[i].<field>`      |
//! | `offchain` | [`offchain`] | [`ShareClaim`]               | `packedData`, `subject`, `signature`|
//! | `payload`  | [`payload`]  | each [`DataNode`]            | `data[i]<json pointer>`             |
//! | `onchain`  | [`onchain`]  | claim + decoded ledger logs  | event name, `subject`, `attester`   |
//!
//! [`Verifier::verify`] runs them in order and stops at the first stage that
//! reports errors.
//!
//! ## Rejections vs. Failures
//!
//! A [`Verdict`] is a statement about the claim. A [`VerifyError`] means the
//! run could not be completed (ledger unreachable, transaction unknown) and
//! must not be read as a rejection.
//!
//! [`ShareClaim`]: shv_core::ShareClaim
//! [`DataNode`]: shv_core::DataNode

pub mod config;
pub mod error;
pub mod offchain;
pub mod onchain;
pub mod options;
pub mod payload;
pub mod pipeline;
pub mod shape;
pub mod verdict;

pub use config::VerifierConfig;
pub use error::{ConfigError, VerifyError};
pub use options::{OnchainOptions, SignedMessage, VerifyOptions};
pub use payload::{
    AcceptAllPayloads, NodePayloadReport, PayloadValidator, SchemaPayloadValidator,
};
pub use pipeline::Verifier;
pub use verdict::{Stage, Verdict};
