//! # In-Memory Log Source
//!
//! A [`LogSource`] answering from a fixed table of transactions. Used for
//! offline verification against an exported log fixture, and in tests to
//! script per-transaction latency and failures.
//!
//! Fixture format (JSON object keyed by transaction id):
//!
//! ```json
//! {
//!   "0xabc…": [
//!     { "name": "TraitAttested",
//!       "fields": { "subject": "0x…", "attester": "0x…", "layer2Hash": "0x…" } }
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use shv_core::TxId;
use url::Url;

use crate::error::LedgerError;
use crate::event::DecodedLogEvent;
use crate::source::LogSource;

/// Fixed-table [`LogSource`]. Unknown transactions are
/// [`LedgerError::TransactionNotFound`].
#[derive(Debug, Default)]
pub struct StaticLogSource {
    logs: HashMap<TxId, Vec<DecodedLogEvent>>,
    delays: HashMap<TxId, Duration>,
    failures: HashMap<TxId, String>,
    fetches: AtomicUsize,
}

impl StaticLogSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the events `tx` emitted.
    pub fn with_logs(mut self, tx: &str, events: Vec<DecodedLogEvent>) -> Self {
        self.logs.insert(TxId::new(tx), events);
        self
    }

    /// Delay every fetch of `tx` by `delay`.
    pub fn with_delay(mut self, tx: &str, delay: Duration) -> Self {
        self.delays.insert(TxId::new(tx), delay);
        self
    }

    /// Make every fetch of `tx` fail with [`LedgerError::Unavailable`].
    pub fn with_failure(mut self, tx: &str, reason: impl Into<String>) -> Self {
        self.failures.insert(TxId::new(tx), reason.into());
        self
    }

    /// Load a fixture from a JSON value.
    pub fn from_json(value: serde_json::Value) -> Result<Self, LedgerError> {
        let table: HashMap<String, Vec<DecodedLogEvent>> = serde_json::from_value(value)
            .map_err(|e| LedgerError::Config(format!("invalid log fixture: {e}")))?;
        Ok(table
            .into_iter()
            .fold(Self::new(), |src, (tx, events)| src.with_logs(&tx, events)))
    }

    /// Load a fixture from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, LedgerError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            LedgerError::Config(format!("cannot read log fixture {}: {e}", path.display()))
        })?;
        let value = serde_json::from_str(&raw)
            .map_err(|e| LedgerError::Config(format!("invalid log fixture: {e}")))?;
        Self::from_json(value)
    }

    /// Number of fetches served so far, successful or not.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LogSource for StaticLogSource {
    async fn fetch_decoded_logs(
        &self,
        _endpoint: &Url,
        tx: &TxId,
    ) -> Result<Vec<DecodedLogEvent>, LedgerError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(tx) {
            tokio::time::sleep(*delay).await;
        }
        if let Some(reason) = self.failures.get(tx) {
            return Err(LedgerError::Unavailable(reason.clone()));
        }
        self.logs
            .get(tx)
            .cloned()
            .ok_or_else(|| LedgerError::TransactionNotFound(tx.clone()))
    }
}
