//! # Verifier Configuration
//!
//! Loaded from an optional YAML file, then overridden by environment
//! variables. Produces the typed [`VerifyOptions`] and collaborators a
//! [`Verifier`] needs.
//!
//! | Variable                  | YAML key              | Default              |
//! |---------------------------|-----------------------|----------------------|
//! | `SHV_CONFIG`              | (file path)           | unset                |
//! | `SHV_ONCHAIN`             | `onchain`             | on iff a URL is set  |
//! | `SHV_LEDGER_URL`          | `ledger_url`          | unset                |
//! | `SHV_EVENT_SIGNATURE`     | `event_signature`     | `TraitAttested(...)` |
//! | `SHV_HASH_FIELD`          | `hash_field`          | `layer2Hash`         |
//! | `SHV_LEDGER_TIMEOUT_SECS` | `ledger_timeout_secs` | `30`                 |
//! | `SHV_PAYLOAD_SCHEMA`      | `payload_schema`      | unset                |
//! | `SHV_SIGNED_MESSAGE`      | `signed_message`      | `text`               |

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use shv_ledger::{EventAbi, JsonRpcLogSource, LedgerConfig, DEFAULT_EVENT_SIGNATURE};
use url::Url;

use crate::error::ConfigError;
use crate::options::{
    OnchainOptions, SignedMessage, VerifyOptions, DEFAULT_HASH_FIELD, EVENT_ATTESTER_FIELD,
    EVENT_SUBJECT_FIELD,
};
use crate::payload::{AcceptAllPayloads, PayloadValidator, SchemaPayloadValidator};
use crate::pipeline::Verifier;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VerifierConfig {
    /// Explicit on/off for the on-chain stage.
    pub onchain: Option<bool>,
    pub ledger_url: Option<String>,
    pub event_signature: String,
    pub hash_field: String,
    pub ledger_timeout_secs: u64,
    pub payload_schema: Option<PathBuf>,
    /// `text` or `hash_bytes`; see [`SignedMessage`].
    pub signed_message: SignedMessage,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            onchain: None,
            ledger_url: None,
            event_signature: DEFAULT_EVENT_SIGNATURE.to_string(),
            hash_field: DEFAULT_HASH_FIELD.to_string(),
            ledger_timeout_secs: LedgerConfig::default().timeout_secs,
            payload_schema: None,
            signed_message: SignedMessage::default(),
        }
    }
}

impl VerifierConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(|var| std::env::var(var).ok())
    }

    /// Load using `lookup` in place of the process environment.
    pub fn load(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base = match lookup("SHV_CONFIG") {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        base.with_overrides(lookup)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Yaml {
            path: path.display().to_string(),
            source,
        })
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(raw) = lookup("SHV_ONCHAIN") {
            self.onchain = Some(parse_bool("SHV_ONCHAIN", &raw)?);
        }
        if let Some(url) = lookup("SHV_LEDGER_URL") {
            self.ledger_url = Some(url);
        }
        if let Some(sig) = lookup("SHV_EVENT_SIGNATURE") {
            self.event_signature = sig;
        }
        if let Some(field) = lookup("SHV_HASH_FIELD") {
            self.hash_field = field;
        }
        if let Some(raw) = lookup("SHV_LEDGER_TIMEOUT_SECS") {
            self.ledger_timeout_secs = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                var: "SHV_LEDGER_TIMEOUT_SECS".into(),
                reason: format!("'{raw}' is not a whole number of seconds"),
            })?;
        }
        if let Some(path) = lookup("SHV_PAYLOAD_SCHEMA") {
            self.payload_schema = Some(PathBuf::from(path));
        }
        if let Some(raw) = lookup("SHV_SIGNED_MESSAGE") {
            self.signed_message = raw.parse().map_err(|reason| ConfigError::InvalidValue {
                var: "SHV_SIGNED_MESSAGE".into(),
                reason,
            })?;
        }
        Ok(self)
    }

    pub fn onchain_enabled(&self) -> bool {
        self.onchain.unwrap_or(self.ledger_url.is_some())
    }

    /// Parse the attestation event and check it carries the fields the
    /// cross-validator reads.
    pub fn event_abi(&self) -> Result<EventAbi, ConfigError> {
        let abi = EventAbi::parse(&self.event_signature).map_err(ConfigError::EventSignature)?;
        for field in [self.hash_field.as_str(), EVENT_SUBJECT_FIELD, EVENT_ATTESTER_FIELD] {
            if !abi.params.iter().any(|p| p.name == field) {
                return Err(ConfigError::EventSignature(format!(
                    "{} has no parameter named '{field}'",
                    abi.name
                )));
            }
        }
        Ok(abi)
    }

    pub fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            timeout_secs: self.ledger_timeout_secs,
        }
    }

    pub fn verify_options(&self) -> Result<VerifyOptions, ConfigError> {
        if !self.onchain_enabled() {
            return Ok(VerifyOptions::offchain_only().with_signed_message(self.signed_message));
        }
        let raw = self.ledger_url.as_deref().ok_or(ConfigError::MissingLedgerUrl)?;
        let endpoint = Url::parse(raw).map_err(|e| ConfigError::InvalidValue {
            var: "SHV_LEDGER_URL".into(),
            reason: e.to_string(),
        })?;
        let abi = self.event_abi()?;
        Ok(VerifyOptions {
            onchain: Some(
                OnchainOptions::new(endpoint)
                    .with_event_name(abi.name)
                    .with_hash_field(self.hash_field.clone()),
            ),
            signed_message: self.signed_message,
        })
    }

    pub fn payload_validator(&self) -> Result<Arc<dyn PayloadValidator>, ConfigError> {
        Ok(match &self.payload_schema {
            Some(path) => Arc::new(SchemaPayloadValidator::from_file(path)?),
            None => Arc::new(AcceptAllPayloads),
        })
    }

    /// Build a verifier backed by the JSON-RPC ledger client.
    pub fn build_verifier(&self) -> Result<Verifier, ConfigError> {
        let options = self.verify_options()?;
        let source = JsonRpcLogSource::new(self.ledger_config(), vec![self.event_abi()?])?;
        Ok(Verifier::new(options, Arc::new(source)).with_payload_validator(self.payload_validator()?))
    }
}

fn parse_bool(var: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            var: var.to_string(),
            reason: format!("'{other}' is not a boolean"),
        }),
    }
}
