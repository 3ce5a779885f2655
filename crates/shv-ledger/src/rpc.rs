//! # Ethereum JSON-RPC Log Source
//!
//! Fetches a transaction receipt with `eth_getTransactionReceipt` and decodes
//! its logs against a set of known [`EventAbi`] declarations.
//!
//! ## Decoding Rules
//!
//! - A log whose `topics[0]` matches no known event is skipped. Ledger
//!   transactions routinely emit events the verifier does not care about.
//! - A log whose `topics[0]` matches a known event but whose body does not
//!   decode is a [`LedgerError::Decode`].
//! - A `null` receipt is [`LedgerError::TransactionNotFound`].
//! - A reverted transaction (`status: "0x0"`) carries no logs and decodes to
//!   an empty vector.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use shv_core::TxId;
use url::Url;

use crate::abi::EventAbi;
use crate::error::LedgerError;
use crate::event::DecodedLogEvent;
use crate::source::LogSource;

/// Default event the verifier cross-checks attestations against.
pub const DEFAULT_EVENT_SIGNATURE: &str =
    "TraitAttested(address indexed subject, address indexed attester, bytes32 layer2Hash)";

/// HTTP client settings for [`JsonRpcLogSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

/// [`LogSource`] backed by an Ethereum-compatible JSON-RPC endpoint.
#[derive(Debug)]
pub struct JsonRpcLogSource {
    http: reqwest::Client,
    events: Vec<EventAbi>,
    next_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<RawReceipt>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RawReceipt {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    logs: Vec<RawLog>,
}

#[derive(Debug, Deserialize)]
struct RawLog {
    #[serde(default)]
    topics: Vec<String>,
    #[serde(default)]
    data: String,
}

impl JsonRpcLogSource {
    /// Build a source that recognises `events`.
    pub fn new(config: LedgerConfig, events: Vec<EventAbi>) -> Result<Self, LedgerError> {
        if events.is_empty() {
            return Err(LedgerError::Config("at least one event ABI is required".into()));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LedgerError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;
        Ok(Self {
            http,
            events,
            next_id: AtomicU64::new(1),
        })
    }

    /// Build a source that recognises only the default `TraitAttested` event.
    pub fn with_default_event(config: LedgerConfig) -> Result<Self, LedgerError> {
        let abi = EventAbi::parse(DEFAULT_EVENT_SIGNATURE).map_err(LedgerError::Config)?;
        Self::new(config, vec![abi])
    }

    pub fn events(&self) -> &[EventAbi] {
        &self.events
    }

    fn decode_receipt(&self, tx: &TxId, receipt: RawReceipt) -> Result<Vec<DecodedLogEvent>, LedgerError> {
        if receipt.status.as_deref().is_some_and(|s| parse_quantity(s) == Some(0)) {
            tracing::debug!(%tx, "transaction reverted; no logs");
            return Ok(Vec::new());
        }

        let decode_err = |reason: String| LedgerError::Decode {
            tx: tx.clone(),
            reason,
        };

        let mut decoded = Vec::new();
        for (index, log) in receipt.logs.iter().enumerate() {
            let topics = log
                .topics
                .iter()
                .map(|t| decode_word(t))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| decode_err(format!("log {index}: {e}")))?;
            let Some(topic0) = topics.first() else {
                continue;
            };
            let Some(abi) = self.events.iter().find(|abi| abi.topic0() == topic0) else {
                tracing::trace!(%tx, index, "skipping log with unknown topic0");
                continue;
            };
            let data = decode_hex(&log.data).map_err(|e| decode_err(format!("log {index}: {e}")))?;
            let event = abi
                .decode(&topics, &data)
                .map_err(|e| decode_err(format!("log {index}: {e}")))?;
            decoded.push(event);
        }
        Ok(decoded)
    }
}

#[async_trait]
impl LogSource for JsonRpcLogSource {
    async fn fetch_decoded_logs(
        &self,
        endpoint: &Url,
        tx: &TxId,
    ) -> Result<Vec<DecodedLogEvent>, LedgerError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "eth_getTransactionReceipt",
            "params": [tx.as_str()],
        });
        tracing::debug!(%tx, %endpoint, "fetching transaction receipt");

        let resp = self
            .http
            .post(endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| LedgerError::Http {
                endpoint: endpoint.to_string(),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(%tx, status, "ledger endpoint returned error status");
            return Err(LedgerError::Status {
                endpoint: endpoint.to_string(),
                status,
                body,
            });
        }

        let body: RpcResponse = resp.json().await.map_err(|e| LedgerError::Decode {
            tx: tx.clone(),
            reason: format!("invalid JSON-RPC response: {e}"),
        })?;

        if let Some(err) = body.error {
            tracing::warn!(%tx, code = err.code, "ledger RPC error");
            return Err(LedgerError::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        let receipt = body
            .result
            .ok_or_else(|| LedgerError::TransactionNotFound(tx.clone()))?;
        let events = self.decode_receipt(tx, receipt)?;
        tracing::debug!(%tx, events = events.len(), "decoded transaction logs");
        Ok(events)
    }
}

fn decode_hex(s: &str) -> Result<Vec<u8>, String> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(digits).map_err(|e| format!("invalid hex '{s}': {e}"))
}

fn decode_word(s: &str) -> Result<[u8; 32], String> {
    let bytes = decode_hex(s)?;
    <[u8; 32]>::try_from(bytes.as_slice()).map_err(|_| format!("topic '{s}' is not 32 bytes"))
}

fn parse_quantity(s: &str) -> Option<u64> {
    u64::from_str_radix(s.strip_prefix("0x").unwrap_or(s), 16).ok()
}
