//! The log retrieval seam.

use async_trait::async_trait;
use shv_core::TxId;
use url::Url;

use crate::error::LedgerError;
use crate::event::DecodedLogEvent;

/// Retrieves the decoded events a transaction emitted.
///
/// Implementations must be safe to call concurrently: the verifier issues
/// one fetch per distinct transaction and awaits them together. Log order
/// within a transaction is preserved; a transaction that emitted no
/// recognised events yields an empty vector, not an error.
#[async_trait]
pub trait LogSource: Send + Sync {
    async fn fetch_decoded_logs(
        &self,
        endpoint: &Url,
        tx: &TxId,
    ) -> Result<Vec<DecodedLogEvent>, LedgerError>;
}

#[async_trait]
impl<T: LogSource + ?Sized> LogSource for std::sync::Arc<T> {
    async fn fetch_decoded_logs(
        &self,
        endpoint: &Url,
        tx: &TxId,
    ) -> Result<Vec<DecodedLogEvent>, LedgerError> {
        (**self).fetch_decoded_logs(endpoint, tx).await
    }
}
