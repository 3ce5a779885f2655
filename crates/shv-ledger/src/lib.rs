//! # shv-ledger — Ledger Log Access
//!
//! Retrieves the events a ledger transaction emitted and decodes them into
//! [`DecodedLogEvent`] values the on-chain cross-validator compares against.
//!
//! ## Architecture
//!
//! ```text
//! LogSource (async trait)
//!   ├─ JsonRpcLogSource   eth_getTransactionReceipt + EventAbi decoding
//!   └─ StaticLogSource    in-memory, for tests and offline verification
//! ```
//!
//! ## No Implicit Retry
//!
//! A fetch is a single attempt. Any failure is returned to the caller as a
//! [`LedgerError`]; retry policy, if any, belongs to whoever wraps the
//! source.

pub mod abi;
pub mod error;
pub mod event;
pub mod rpc;
pub mod source;
pub mod static_source;

pub use abi::{AbiType, EventAbi, EventParam};
pub use error::LedgerError;
pub use event::{DecodedLogEvent, DecodedValue};
pub use rpc::{JsonRpcLogSource, LedgerConfig, DEFAULT_EVENT_SIGNATURE};
pub use source::LogSource;
pub use static_source::StaticLogSource;
