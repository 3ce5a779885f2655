//! Per-run verification options.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use shv_core::identity::strip_hex_prefix;
use url::Url;

/// Default attestation event name.
pub const DEFAULT_EVENT_NAME: &str = "TraitAttested";
/// Default event field holding the committed node hash.
pub const DEFAULT_HASH_FIELD: &str = "layer2Hash";
/// Event field holding the attested subject.
pub const EVENT_SUBJECT_FIELD: &str = "subject";
/// Event field holding the attester.
pub const EVENT_ATTESTER_FIELD: &str = "attester";

/// What a claimant's EIP-191 signature covers.
///
/// Signing libraries disagree on a `0x…` string: some sign its text, others
/// hex-decode it first. Claims from either kind of signer verify once the
/// matching mode is configured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignedMessage {
    /// The UTF-8 text of `packedData`, `0x` prefix included.
    #[default]
    Text,
    /// The digest bytes `packedData` encodes.
    HashBytes,
}

impl SignedMessage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::HashBytes => "hash_bytes",
        }
    }

    /// Message bytes signed for `packed_data`. `None` in `HashBytes` mode
    /// when `packed_data` is not hex.
    pub fn message_bytes(&self, packed_data: &str) -> Option<Vec<u8>> {
        match self {
            Self::Text => Some(packed_data.as_bytes().to_vec()),
            Self::HashBytes => hex::decode(strip_hex_prefix(packed_data.trim())).ok(),
        }
    }
}

impl fmt::Display for SignedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignedMessage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "text" => Ok(Self::Text),
            "hash_bytes" => Ok(Self::HashBytes),
            other => Err(format!("'{other}' is not one of text, hash_bytes")),
        }
    }
}

/// Options handed to [`Verifier`](crate::Verifier).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyOptions {
    /// On-chain cross-validation; `None` verifies off-chain only.
    pub onchain: Option<OnchainOptions>,
    pub signed_message: SignedMessage,
}

impl VerifyOptions {
    pub fn offchain_only() -> Self {
        Self::default()
    }

    pub fn with_onchain(endpoint: Url) -> Self {
        Self {
            onchain: Some(OnchainOptions::new(endpoint)),
            ..Self::default()
        }
    }

    pub fn with_signed_message(mut self, mode: SignedMessage) -> Self {
        self.signed_message = mode;
        self
    }
}

/// Ledger cross-validation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnchainOptions {
    /// Ledger endpoint passed to the log source.
    pub endpoint: Url,
    /// Name of the attestation event to match.
    pub event_name: String,
    /// Event field compared to each node's `layer2Hash`. Deployments
    /// differ between `layer2Hash` and `dataHash`.
    pub hash_field: String,
}

impl OnchainOptions {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            event_name: DEFAULT_EVENT_NAME.to_string(),
            hash_field: DEFAULT_HASH_FIELD.to_string(),
        }
    }

    pub fn with_event_name(mut self, name: impl Into<String>) -> Self {
        self.event_name = name.into();
        self
    }

    pub fn with_hash_field(mut self, field: impl Into<String>) -> Self {
        self.hash_field = field.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PACKED: &str = "0x00ff10";

    #[test]
    fn text_mode_signs_the_string() {
        assert_eq!(
            SignedMessage::Text.message_bytes(PACKED).unwrap(),
            PACKED.as_bytes()
        );
    }

    #[test]
    fn hash_bytes_mode_decodes_hex() {
        assert_eq!(
            SignedMessage::HashBytes.message_bytes(PACKED).unwrap(),
            vec![0x00, 0xff, 0x10]
        );
        assert_eq!(
            SignedMessage::HashBytes.message_bytes("00FF10").unwrap(),
            vec![0x00, 0xff, 0x10]
        );
        assert!(SignedMessage::HashBytes.message_bytes("0xzz").is_none());
    }

    #[test]
    fn parses_config_spellings() {
        assert_eq!("text".parse::<SignedMessage>().unwrap(), SignedMessage::Text);
        assert_eq!("hash_bytes".parse::<SignedMessage>().unwrap(), SignedMessage::HashBytes);
        assert_eq!("Hash-Bytes".parse::<SignedMessage>().unwrap(), SignedMessage::HashBytes);
        assert!("raw".parse::<SignedMessage>().is_err());
    }

    #[test]
    fn defaults_to_text() {
        assert_eq!(VerifyOptions::offchain_only().signed_message, SignedMessage::Text);
        assert_eq!(
            VerifyOptions::offchain_only()
                .with_signed_message(SignedMessage::HashBytes)
                .signed_message,
            SignedMessage::HashBytes
        );
    }
}
