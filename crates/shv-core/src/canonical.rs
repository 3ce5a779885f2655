//! # Canonical Serialization — Deterministic Key Ordering
//!
//! Defines `CanonicalValue`, the immutable tagged tree every structured
//! input is converted into before hashing, and `CanonicalBytes`, the sole
//! construction path for bytes used in content-digest computation.
//!
//! ## Rules
//!
//! 1. **Mappings** — keys sorted ascending by UTF-16 code unit, at every
//!    nesting level. This is the order a JavaScript signer obtains from
//!    `Object.keys(obj).sort()`; for text inside the Basic Multilingual
//!    Plane it coincides with byte order.
//! 2. **Sequences** — element order is preserved; elements are
//!    canonicalized recursively.
//! 3. **Numbers** — integers pass through. Floats with no fractional part
//!    and magnitude below `1e21` are written as plain digits, as
//!    `JSON.stringify` writes them: `1.0` → `1`, `1e16` →
//!    `10000000000000000`. Past `2^53` the digits are the shortest
//!    round-trip form padded with zeros, not the exact binary value. Other
//!    floats use the shortest round-trip representation.
//! 4. **Serialization** — compact separators, no whitespace, mapping
//!    entries in stored (sorted) order.
//!
//! ## Security Invariant
//!
//! `CanonicalBytes` has a private inner field. The only ways to construct it
//! are `CanonicalBytes::new()` and `CanonicalBytes::from_canonical()`, both of
//! which go through `canonicalize()`. Any function computing a content digest
//! accepts `&CanonicalBytes`, so hashing raw request bytes is a compile error.

use std::cmp::Ordering;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::{Number, Value};

use crate::error::CanonicalizationError;

/// Largest integer exactly representable in an IEEE-754 double.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Whole floats at or above this magnitude keep exponent notation.
const PLAIN_DIGITS_LIMIT: f64 = 1e21;

/// A canonicalized structured value.
///
/// # Invariants
///
/// - Every `Mapping` holds its entries sorted by [`key_order`], without
///   duplicate keys.
/// - Every `Number` is normalized per the module rules.
///
/// Values produced by [`canonicalize()`] always satisfy these. A tree built
/// by hand can be brought into canonical form with
/// [`CanonicalValue::canonicalize()`].
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Sequence(Vec<CanonicalValue>),
    Mapping(Vec<(String, CanonicalValue)>),
}

/// Canonicalize an untyped JSON tree.
///
/// Pure function: the input is borrowed and a new tree is returned.
pub fn canonicalize(value: &Value) -> CanonicalValue {
    match value {
        Value::Null => CanonicalValue::Null,
        Value::Bool(b) => CanonicalValue::Bool(*b),
        Value::Number(n) => CanonicalValue::Number(normalize_number(n)),
        Value::String(s) => CanonicalValue::String(s.clone()),
        Value::Array(items) => CanonicalValue::Sequence(items.iter().map(canonicalize).collect()),
        Value::Object(map) => {
            let mut entries: Vec<(String, CanonicalValue)> = map
                .iter()
                .map(|(k, v)| (k.clone(), canonicalize(v)))
                .collect();
            entries.sort_by(|a, b| key_order(&a.0, &b.0));
            CanonicalValue::Mapping(entries)
        }
    }
}

/// Ordering used for mapping keys: ascending UTF-16 code units.
pub fn key_order(a: &str, b: &str) -> Ordering {
    a.encode_utf16().cmp(b.encode_utf16())
}

fn normalize_number(n: &Number) -> Number {
    if n.is_f64() {
        if let Some(f) = n.as_f64() {
            if f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER {
                // Exact: |f| <= 2^53 - 1 and integral.
                return Number::from(f as i64);
            }
        }
    }
    n.clone()
}

/// Plain-digit form of a whole float in `(2^53 - 1, 1e21)`.
///
/// `f64`'s `Display` never uses an exponent and prints the shortest
/// round-trip digits, padding with zeros, which is what JavaScript prints.
fn plain_digits(n: &Number) -> Option<i128> {
    if !n.is_f64() {
        return None;
    }
    let f = n.as_f64()?;
    if f.fract() != 0.0 || f.abs() >= PLAIN_DIGITS_LIMIT {
        return None;
    }
    f.to_string().parse().ok()
}

impl CanonicalValue {
    /// Re-canonicalize this tree.
    ///
    /// Idempotent: for any tree `t`, `t.canonicalize().canonicalize() == t.canonicalize()`.
    /// On a tree produced by [`canonicalize()`] this returns an equal tree.
    pub fn canonicalize(&self) -> CanonicalValue {
        match self {
            Self::Null => Self::Null,
            Self::Bool(b) => Self::Bool(*b),
            Self::Number(n) => Self::Number(normalize_number(n)),
            Self::String(s) => Self::String(s.clone()),
            Self::Sequence(items) => Self::Sequence(items.iter().map(Self::canonicalize).collect()),
            Self::Mapping(entries) => {
                let mut sorted: Vec<(String, CanonicalValue)> = Vec::with_capacity(entries.len());
                for (k, v) in entries {
                    let v = v.canonicalize();
                    // Last write wins, matching JSON object semantics.
                    match sorted.iter_mut().find(|(existing, _)| existing == k) {
                        Some(slot) => slot.1 = v,
                        None => sorted.push((k.clone(), v)),
                    }
                }
                sorted.sort_by(|a, b| key_order(&a.0, &b.0));
                Self::Mapping(sorted)
            }
        }
    }

    /// Look up a key in a mapping. Returns `None` for non-mappings.
    pub fn get(&self, key: &str) -> Option<&CanonicalValue> {
        match self {
            Self::Mapping(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Borrow the string content of a `String` variant.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Convert back into an untyped JSON value.
    ///
    /// Used at boundaries that need `serde_json::Value` (schema validation,
    /// response bodies). Key order of the result is not significant.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => Value::Number(n.clone()),
            Self::String(s) => Value::String(s.clone()),
            Self::Sequence(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Mapping(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<&Value> for CanonicalValue {
    fn from(value: &Value) -> Self {
        canonicalize(value)
    }
}

impl Serialize for CanonicalValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => match plain_digits(n) {
                Some(digits) => serializer.serialize_i128(digits),
                None => n.serialize(serializer),
            },
            Self::String(s) => serializer.serialize_str(s),
            Self::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Mapping(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

/// Bytes produced exclusively by canonical serialization.
///
/// # Invariants
///
/// - Only constructed through [`CanonicalBytes::new()`] or
///   [`CanonicalBytes::from_canonical()`].
/// - Mapping keys sorted at every level, compact separators, UTF-8.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Construct canonical bytes from any serializable value.
    ///
    /// The value is converted to JSON, canonicalized, then serialized.
    ///
    /// # Errors
    ///
    /// Returns `CanonicalizationError::SerializationFailed` if the value
    /// cannot be represented as JSON (e.g. a map with non-string keys).
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        Self::from_canonical(&canonicalize(&value))
    }

    /// Serialize an already-built canonical tree.
    ///
    /// The tree is re-canonicalized first, so a hand-built tree with
    /// unsorted keys still yields canonical bytes.
    pub fn from_canonical(value: &CanonicalValue) -> Result<Self, CanonicalizationError> {
        let bytes = serde_json::to_vec(&value.canonicalize())?;
        Ok(Self(bytes))
    }

    /// Access the canonical bytes for digest computation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The canonical serialization as text.
    pub fn as_str(&self) -> &str {
        // serde_json only ever emits UTF-8.
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
