//! # Decoded Log Events
//!
//! A [`DecodedLogEvent`] is one event emitted by a transaction, with its
//! parameters keyed by their ABI names. Field names and values are kept
//! exactly as decoded.
//!
//! ## Serialization
//!
//! Values serialize as plain JSON: booleans as `true`/`false`, everything
//! else as its rendered string (checksummed address, `0x` hex for byte
//! strings, decimal for integers). Deserialization accepts the same plain
//! form, producing [`DecodedValue::Bool`] or [`DecodedValue::Text`], which is
//! how fixtures for [`StaticLogSource`](crate::StaticLogSource) are written.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use shv_core::{hex_eq, EthAddress};

/// One decoded event parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedValue {
    Address(EthAddress),
    /// `bytesN`, and the topic hash of an indexed dynamic parameter.
    FixedBytes(Vec<u8>),
    /// Unsigned integer, decimal.
    Uint(String),
    /// Signed integer, decimal.
    Int(String),
    Bool(bool),
    /// `string` parameters, and untyped fixture values.
    Text(String),
    /// Dynamic `bytes`.
    Bytes(Vec<u8>),
}

impl DecodedValue {
    /// Render as the string a claimant would write.
    pub fn render(&self) -> String {
        match self {
            Self::Address(a) => a.to_checksum(),
            Self::FixedBytes(b) | Self::Bytes(b) => format!("0x{}", hex::encode(b)),
            Self::Uint(n) | Self::Int(n) => n.clone(),
            Self::Bool(b) => b.to_string(),
            Self::Text(s) => s.clone(),
        }
    }

    /// Whether this value denotes the same thing as a claimed string.
    ///
    /// Addresses compare by parsed bytes; byte strings and text compare as
    /// hex when both sides are hex, otherwise case-insensitively; integers
    /// compare as trimmed decimal text.
    pub fn matches(&self, claimed: &str) -> bool {
        match self {
            Self::Address(a) => EthAddress::from_hex(claimed).is_ok_and(|c| &c == a),
            Self::FixedBytes(_) | Self::Bytes(_) => hex_eq(&self.render(), claimed),
            Self::Uint(n) | Self::Int(n) => n == claimed.trim(),
            Self::Bool(b) => claimed.trim().eq_ignore_ascii_case(&b.to_string()),
            Self::Text(s) => hex_eq(s, claimed),
        }
    }
}

impl std::fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

impl Serialize for DecodedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Bool(b) => serializer.serialize_bool(*b),
            other => serializer.serialize_str(&other.render()),
        }
    }
}

impl<'de> Deserialize<'de> for DecodedValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Plain {
            Bool(bool),
            Text(String),
        }
        Ok(match Plain::deserialize(deserializer)? {
            Plain::Bool(b) => Self::Bool(b),
            Plain::Text(s) => Self::Text(s),
        })
    }
}

/// One event emitted by a ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedLogEvent {
    /// Event type, e.g. `TraitAttested`.
    pub name: String,
    /// Decoded parameters by name.
    #[serde(default)]
    pub fields: BTreeMap<String, DecodedValue>,
}

impl DecodedLogEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field insertion.
    pub fn with_field(mut self, name: impl Into<String>, value: DecodedValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn field(&self, name: &str) -> Option<&DecodedValue> {
        self.fields.get(name)
    }
}
