//! # Verification Pipeline
//!
//! Sequences the stages with strict gating:
//!
//! ```text
//! shape ──▶ decode ──▶ off-chain ──▶ payload ──▶ [ledger fan-out] ──▶ on-chain
//! ```
//!
//! The first stage producing errors ends the run with
//! [`Verdict::Rejected`] carrying that stage's full error sequence. Errors
//! are accumulated within a stage, never across stages.
//!
//! ## Ledger Fan-out
//!
//! Each distinct transaction id referenced by the claim is fetched exactly
//! once. The fetches run concurrently on the calling task through
//! `FuturesUnordered`; each future yields its own `TxId` alongside the result
//! so completions are keyed, not ordered. The first failed lookup aborts the
//! run with [`VerifyError::Ledger`] and drops the lookups still in flight.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::Value;
use shv_core::{ShareClaim, TxId, ValidationError};
use shv_ledger::{DecodedLogEvent, LogSource};
use tracing::Instrument;
use url::Url;
use uuid::Uuid;

use crate::error::VerifyError;
use crate::offchain::validate_offchain_with;
use crate::onchain::cross_validate;
use crate::options::VerifyOptions;
use crate::payload::{validate_payloads, AcceptAllPayloads, PayloadValidator};
use crate::shape::validate_shape;
use crate::verdict::{Stage, Verdict};

/// Stateless claim verifier. One instance serves any number of concurrent
/// runs; each run owns its claim and its in-flight lookups.
#[derive(Clone)]
pub struct Verifier {
    options: VerifyOptions,
    logs: Arc<dyn LogSource>,
    payloads: Arc<dyn PayloadValidator>,
}

impl std::fmt::Debug for Verifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Verifier")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Verifier {
    pub fn new(options: VerifyOptions, logs: Arc<dyn LogSource>) -> Self {
        Self {
            options,
            logs,
            payloads: Arc::new(AcceptAllPayloads),
        }
    }

    pub fn with_payload_validator(mut self, payloads: Arc<dyn PayloadValidator>) -> Self {
        self.payloads = payloads;
        self
    }

    pub fn options(&self) -> &VerifyOptions {
        &self.options
    }

    /// Verify a raw claim.
    ///
    /// `Ok(Verdict)` is a statement about the claim. `Err` means the run
    /// could not be completed and says nothing about the claim.
    pub async fn verify(&self, raw: &Value) -> Result<Verdict, VerifyError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("verify", %run_id);
        let result = self.run(raw).instrument(span.clone()).await;

        let _entered = span.enter();
        match &result {
            Ok(Verdict::Accepted { token }) => {
                metrics::counter!("shv_verifications_total", "outcome" => "accepted").increment(1);
                tracing::info!(%token, "claim accepted");
            }
            Ok(Verdict::Rejected { stage, errors }) => {
                metrics::counter!("shv_verifications_total", "outcome" => "rejected").increment(1);
                metrics::counter!("shv_rejections_total", "stage" => stage.as_str()).increment(1);
                tracing::info!(%stage, errors = errors.len(), "claim rejected");
            }
            Err(e) => {
                metrics::counter!("shv_verifications_total", "outcome" => "error").increment(1);
                tracing::warn!(error = %e, "verification could not be completed");
            }
        }
        result
    }

    async fn run(&self, raw: &Value) -> Result<Verdict, VerifyError> {
        let errors = validate_shape(raw);
        if let Some(rejected) = gate(Stage::Shape, errors) {
            return Ok(rejected);
        }

        let claim = ShareClaim::from_value(raw)?;
        tracing::debug!(nodes = claim.data.len(), "claim decoded");

        let errors = validate_offchain_with(&claim, self.options.signed_message)?;
        if let Some(rejected) = gate(Stage::Offchain, errors) {
            return Ok(rejected);
        }

        let errors = validate_payloads(self.payloads.as_ref(), &claim.data)
            .into_iter()
            .flat_map(|report| report.errors)
            .collect();
        if let Some(rejected) = gate(Stage::Payload, errors) {
            return Ok(rejected);
        }

        if let Some(onchain) = &self.options.onchain {
            let logs = self.fetch_all(&onchain.endpoint, &claim).await?;
            let errors = cross_validate(&claim, &logs, onchain);
            if let Some(rejected) = gate(Stage::Onchain, errors) {
                return Ok(rejected);
            }
        } else {
            tracing::debug!("on-chain stage disabled");
        }

        Ok(Verdict::Accepted { token: claim.token })
    }

    async fn fetch_all(
        &self,
        endpoint: &Url,
        claim: &ShareClaim,
    ) -> Result<BTreeMap<TxId, Vec<DecodedLogEvent>>, VerifyError> {
        let distinct: BTreeSet<&TxId> = claim.data.iter().map(|node| node.tx()).collect();
        tracing::debug!(transactions = distinct.len(), "fetching ledger logs");

        let mut pending: FuturesUnordered<_> = distinct
            .into_iter()
            .map(|tx| async move { (tx, self.logs.fetch_decoded_logs(endpoint, tx).await) })
            .collect();

        let mut logs = BTreeMap::new();
        while let Some((tx, result)) = pending.next().await {
            match result {
                Ok(events) => {
                    metrics::counter!("shv_ledger_fetches_total", "result" => "ok").increment(1);
                    logs.insert(tx.clone(), events);
                }
                Err(source) => {
                    metrics::counter!("shv_ledger_fetches_total", "result" => "error").increment(1);
                    tracing::warn!(%tx, error = %source, "ledger lookup failed");
                    return Err(VerifyError::Ledger {
                        tx: tx.clone(),
                        source,
                    });
                }
            }
        }
        Ok(logs)
    }
}

fn gate(stage: Stage, errors: Vec<ValidationError>) -> Option<Verdict> {
    tracing::debug!(%stage, errors = errors.len(), "stage complete");
    if errors.is_empty() {
        None
    } else {
        Some(Verdict::Rejected { stage, errors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shv_ledger::StaticLogSource;

    fn verifier() -> Verifier {
        Verifier::new(VerifyOptions::offchain_only(), Arc::new(StaticLogSource::new()))
    }

    #[tokio::test]
    async fn shape_failure_stops_pipeline() {
        let verdict = verifier().verify(&json!({"token": "t"})).await.unwrap();
        assert_eq!(verdict.stage(), Some(Stage::Shape));
        assert_eq!(verdict.errors().len(), 4);
    }

    #[tokio::test]
    async fn offchain_failure_reported_with_stage() {
        let raw = json!({
            "token": "t",
            "subject": "0x2c7536E3605D9C16a7a3D7b1898e529396a65c23",
            "data": [{"layer2Hash": "0x1", "attester": "0x2", "tx": "0x3"}],
            "packedData": "0x00",
            "signature": "0x00"
        });
        let verdict = verifier().verify(&raw).await.unwrap();
        assert_eq!(verdict.stage(), Some(Stage::Offchain));
        let keys: Vec<_> = verdict.errors().iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, ["packedData", "signature"]);
    }
}
