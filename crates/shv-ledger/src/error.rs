//! Ledger access errors.
//!
//! Every variant is an infrastructure failure: the verification run cannot
//! be completed. None of them says anything about whether a claim is valid.

use shv_core::TxId;

/// Errors from fetching or decoding transaction logs.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// HTTP transport failure (connection refused, timeout, TLS).
    #[error("ledger request to {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The endpoint answered with a non-success HTTP status.
    #[error("ledger endpoint {endpoint} returned {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The JSON-RPC response carried an `error` object.
    #[error("ledger RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The ledger has no receipt for the transaction.
    #[error("transaction {0} not found")]
    TransactionNotFound(TxId),

    /// A response or log could not be decoded.
    #[error("failed to decode logs of {tx}: {reason}")]
    Decode { tx: TxId, reason: String },

    /// The log source is unavailable for reasons outside the protocol.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    /// The source could not be constructed.
    #[error("ledger client configuration error: {0}")]
    Config(String),
}
