//! # Event ABI Parsing and Log Decoding
//!
//! Parses human-readable Solidity event declarations and decodes raw EVM
//! logs emitted by them.
//!
//! ```text
//! TraitAttested(address indexed subject, address indexed attester, bytes32 layer2Hash)
//! ```
//!
//! ## Log Layout
//!
//! - `topics[0]` — Keccak-256 of the canonical signature
//!   (`TraitAttested(address,address,bytes32)`).
//! - `topics[1..]` — indexed parameters in declaration order. Indexed
//!   dynamic values (`string`, `bytes`) are stored as their Keccak-256 hash
//!   and decode to [`DecodedValue::FixedBytes`].
//! - `data` — non-indexed parameters, ABI-encoded as a tuple: one 32-byte
//!   head word each, dynamic values as an offset to `length ‖ bytes`.

use std::fmt;

use shv_core::EthAddress;
use shv_crypto::keccak256;

use crate::event::{DecodedLogEvent, DecodedValue};

const WORD: usize = 32;

/// Supported ABI parameter types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbiType {
    Address,
    Bool,
    Uint(u16),
    Int(u16),
    FixedBytes(u8),
    String,
    Bytes,
}

impl AbiType {
    fn parse(s: &str) -> Result<Self, String> {
        let bits = |digits: &str| -> Result<u16, String> {
            if digits.is_empty() {
                return Ok(256);
            }
            match digits.parse::<u16>() {
                Ok(n) if n > 0 && n <= 256 && n % 8 == 0 => Ok(n),
                _ => Err(format!("invalid integer width in '{s}'")),
            }
        };
        match s {
            "address" => Ok(Self::Address),
            "bool" => Ok(Self::Bool),
            "string" => Ok(Self::String),
            "bytes" => Ok(Self::Bytes),
            _ if s.starts_with("uint") => Ok(Self::Uint(bits(&s[4..])?)),
            _ if s.starts_with("int") => Ok(Self::Int(bits(&s[3..])?)),
            _ if s.starts_with("bytes") => match s[5..].parse::<u8>() {
                Ok(n) if (1..=32).contains(&n) => Ok(Self::FixedBytes(n)),
                _ => Err(format!("invalid fixed bytes width in '{s}'")),
            },
            _ => Err(format!("unsupported ABI type '{s}'")),
        }
    }

    fn is_dynamic(&self) -> bool {
        matches!(self, Self::String | Self::Bytes)
    }
}

impl fmt::Display for AbiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address => f.write_str("address"),
            Self::Bool => f.write_str("bool"),
            Self::Uint(n) => write!(f, "uint{n}"),
            Self::Int(n) => write!(f, "int{n}"),
            Self::FixedBytes(n) => write!(f, "bytes{n}"),
            Self::String => f.write_str("string"),
            Self::Bytes => f.write_str("bytes"),
        }
    }
}

/// One declared event parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventParam {
    pub name: String,
    pub kind: AbiType,
    pub indexed: bool,
}

/// A parsed event declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventAbi {
    pub name: String,
    pub params: Vec<EventParam>,
    topic0: [u8; 32],
}

impl EventAbi {
    /// Parse a human-readable event declaration.
    ///
    /// Accepts an optional leading `event` keyword. Every parameter must be
    /// named, since decoded fields are keyed by name.
    pub fn parse(declaration: &str) -> Result<Self, String> {
        let decl = declaration.trim();
        let decl = decl.strip_prefix("event ").unwrap_or(decl).trim();
        let open = decl
            .find('(')
            .ok_or_else(|| format!("missing '(' in event declaration '{declaration}'"))?;
        let inner = decl[open + 1..]
            .strip_suffix(')')
            .ok_or_else(|| format!("missing ')' in event declaration '{declaration}'"))?;
        let name = decl[..open].trim();
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(format!("invalid event name '{name}'"));
        }

        let mut params = Vec::new();
        for raw in inner.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let tokens: Vec<&str> = raw.split_whitespace().collect();
            let (kind, indexed, param_name) = match tokens.as_slice() {
                [kind, "indexed", name] => (*kind, true, *name),
                [kind, name] if *name != "indexed" => (*kind, false, *name),
                _ => return Err(format!("parameter '{raw}' must be 'type [indexed] name'")),
            };
            params.push(EventParam {
                name: param_name.to_string(),
                kind: AbiType::parse(kind)?,
                indexed,
            });
        }

        let signature = canonical_signature(name, &params);
        Ok(Self {
            name: name.to_string(),
            topic0: keccak256(signature.as_bytes()),
            params,
        })
    }

    /// The canonical signature, e.g. `TraitAttested(address,address,bytes32)`.
    pub fn signature(&self) -> String {
        canonical_signature(&self.name, &self.params)
    }

    /// Keccak-256 of the canonical signature.
    pub fn topic0(&self) -> &[u8; 32] {
        &self.topic0
    }

    /// Decode a raw log emitted by this event.
    ///
    /// `topics` must include `topic0`. Returns an error string describing
    /// the first malformed part.
    pub fn decode(&self, topics: &[[u8; 32]], data: &[u8]) -> Result<DecodedLogEvent, String> {
        if topics.first() != Some(&self.topic0) {
            return Err(format!("topic0 does not match {}", self.signature()));
        }
        let indexed_count = self.params.iter().filter(|p| p.indexed).count();
        if topics.len() != indexed_count + 1 {
            return Err(format!(
                "{} expects {} topics, log has {}",
                self.name,
                indexed_count + 1,
                topics.len()
            ));
        }

        let mut event = DecodedLogEvent::new(&self.name);
        let mut next_topic = topics[1..].iter();
        let mut head = 0usize;
        for param in &self.params {
            let value = if param.indexed {
                let topic = next_topic
                    .next()
                    .ok_or_else(|| format!("missing topic for '{}'", param.name))?;
                if param.kind.is_dynamic() {
                    DecodedValue::FixedBytes(topic.to_vec())
                } else {
                    decode_static(param.kind, topic)
                        .map_err(|e| format!("'{}': {e}", param.name))?
                }
            } else {
                let word = word_at(data, head)?;
                head += WORD;
                if param.kind.is_dynamic() {
                    decode_dynamic(param.kind, data, &word)
                        .map_err(|e| format!("'{}': {e}", param.name))?
                } else {
                    decode_static(param.kind, &word).map_err(|e| format!("'{}': {e}", param.name))?
                }
            };
            event.fields.insert(param.name.clone(), value);
        }
        Ok(event)
    }
}

fn canonical_signature(name: &str, params: &[EventParam]) -> String {
    let types: Vec<String> = params.iter().map(|p| p.kind.to_string()).collect();
    format!("{name}({})", types.join(","))
}

fn word_at(data: &[u8], offset: usize) -> Result<[u8; 32], String> {
    let end = offset
        .checked_add(WORD)
        .filter(|end| *end <= data.len())
        .ok_or_else(|| format!("data too short: need word at {offset}, have {} bytes", data.len()))?;
    let mut word = [0u8; 32];
    word.copy_from_slice(&data[offset..end]);
    Ok(word)
}

fn word_to_usize(word: &[u8; 32]) -> Result<usize, String> {
    if word[..24].iter().any(|b| *b != 0) {
        return Err("offset or length out of range".to_string());
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&word[24..]);
    usize::try_from(u64::from_be_bytes(buf)).map_err(|_| "offset or length out of range".to_string())
}

fn decode_static(kind: AbiType, word: &[u8; 32]) -> Result<DecodedValue, String> {
    match kind {
        AbiType::Address => {
            if word[..12].iter().any(|b| *b != 0) {
                return Err("address word has non-zero padding".to_string());
            }
            let mut bytes = [0u8; 20];
            bytes.copy_from_slice(&word[12..]);
            Ok(DecodedValue::Address(EthAddress::from_bytes(bytes)))
        }
        AbiType::Bool => match (word[..31].iter().all(|b| *b == 0), word[31]) {
            (true, 0) => Ok(DecodedValue::Bool(false)),
            (true, 1) => Ok(DecodedValue::Bool(true)),
            _ => Err("bool word is neither 0 nor 1".to_string()),
        },
        AbiType::Uint(_) => Ok(DecodedValue::Uint(to_decimal(*word))),
        AbiType::Int(_) => {
            if word[0] & 0x80 == 0 {
                Ok(DecodedValue::Int(to_decimal(*word)))
            } else {
                Ok(DecodedValue::Int(format!("-{}", to_decimal(twos_negate(*word)))))
            }
        }
        AbiType::FixedBytes(n) => Ok(DecodedValue::FixedBytes(word[..n as usize].to_vec())),
        AbiType::String | AbiType::Bytes => Err(format!("{kind} is not a static type")),
    }
}

fn decode_dynamic(kind: AbiType, data: &[u8], head: &[u8; 32]) -> Result<DecodedValue, String> {
    let offset = word_to_usize(head)?;
    let len = word_to_usize(&word_at(data, offset)?)?;
    let start = offset + WORD;
    let bytes = start
        .checked_add(len)
        .filter(|end| *end <= data.len())
        .map(|end| data[start..end].to_vec())
        .ok_or_else(|| format!("dynamic value of {len} bytes overruns data"))?;
    match kind {
        AbiType::String => String::from_utf8(bytes)
            .map(DecodedValue::Text)
            .map_err(|e| format!("string is not UTF-8: {e}")),
        _ => Ok(DecodedValue::Bytes(bytes)),
    }
}

/// Big-endian 256-bit unsigned integer to decimal.
fn to_decimal(mut word: [u8; 32]) -> String {
    let mut digits = Vec::new();
    while word.iter().any(|b| *b != 0) {
        let mut rem = 0u16;
        for byte in word.iter_mut() {
            let acc = (rem << 8) | u16::from(*byte);
            *byte = (acc / 10) as u8;
            rem = acc % 10;
        }
        digits.push(b'0' + rem as u8);
    }
    if digits.is_empty() {
        return "0".to_string();
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

fn twos_negate(mut word: [u8; 32]) -> [u8; 32] {
    for b in word.iter_mut() {
        *b = !*b;
    }
    for b in word.iter_mut().rev() {
        let (sum, overflow) = b.overflowing_add(1);
        *b = sum;
        if !overflow {
            break;
        }
    }
    word
}
