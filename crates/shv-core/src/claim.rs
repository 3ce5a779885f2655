//! # Share Claim Model
//!
//! Typed representation of an inbound share claim. The raw request is
//! decoded once, after shape validation, into a [`ShareClaim`] whose data
//! nodes hold their canonicalized content. Everything downstream works on
//! these types.
//!
//! ## Signed Content
//!
//! The claimant signs `packedData`, which commits to the canonical
//! serialization of `{ "data": [...nodes], "token": token }`. Node order is
//! part of that content and is preserved from the request.

use serde_json::Value;

use crate::canonical::{canonicalize, CanonicalBytes, CanonicalValue};
use crate::digest::{keccak256_digest, ContentDigest};
use crate::error::{CanonicalizationError, ClaimDecodeError};
use crate::identity::TxId;

pub const FIELD_TOKEN: &str = "token";
pub const FIELD_SUBJECT: &str = "subject";
pub const FIELD_DATA: &str = "data";
pub const FIELD_PACKED_DATA: &str = "packedData";
pub const FIELD_SIGNATURE: &str = "signature";

pub const NODE_LAYER2_HASH: &str = "layer2Hash";
pub const NODE_ATTESTER: &str = "attester";
pub const NODE_TX: &str = "tx";

/// One attested data unit inside a claim.
#[derive(Debug, Clone, PartialEq)]
pub struct DataNode {
    layer2_hash: String,
    attester: String,
    tx: TxId,
    content: CanonicalValue,
}

impl DataNode {
    /// Decode a node from its raw JSON form.
    ///
    /// `index` is the node's position in `data`, used for error reporting.
    pub fn from_value(index: usize, raw: &Value) -> Result<Self, ClaimDecodeError> {
        if !raw.is_object() {
            return Err(ClaimDecodeError::NodeNotAnObject(index));
        }
        let field = |name: &str| {
            raw.get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| ClaimDecodeError::MissingString(format!("data[{index}].{name}")))
        };
        Ok(Self {
            layer2_hash: field(NODE_LAYER2_HASH)?,
            attester: field(NODE_ATTESTER)?,
            tx: TxId::new(&field(NODE_TX)?),
            content: canonicalize(raw),
        })
    }

    /// Hash of this unit as committed on the ledger.
    pub fn layer2_hash(&self) -> &str {
        &self.layer2_hash
    }

    /// Address expected to have produced the attestation.
    pub fn attester(&self) -> &str {
        &self.attester
    }

    /// Ledger transaction expected to carry the attestation event.
    pub fn tx(&self) -> &TxId {
        &self.tx
    }

    /// The full canonicalized node, including its opaque payload.
    pub fn content(&self) -> &CanonicalValue {
        &self.content
    }
}

/// A claim that a subject shared attested data.
#[derive(Debug, Clone, PartialEq)]
pub struct ShareClaim {
    /// Opaque correlation identifier, part of the signed content.
    pub token: String,
    /// Claimed signer address.
    pub subject: String,
    /// Attested data nodes, in request order.
    pub data: Vec<DataNode>,
    /// Claimed `0x`-prefixed content hash.
    pub packed_data: String,
    /// Hex recoverable signature over `packed_data`.
    pub signature: String,
}

impl ShareClaim {
    /// Decode a shape-validated raw claim.
    ///
    /// String fields are kept exactly as supplied: `token` is hashed and
    /// `packedData` is the signed message, so neither may be altered.
    pub fn from_value(raw: &Value) -> Result<Self, ClaimDecodeError> {
        let obj = raw.as_object().ok_or(ClaimDecodeError::NotAnObject)?;
        let string = |name: &str| {
            obj.get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| ClaimDecodeError::MissingString(name.to_string()))
        };
        let nodes = obj
            .get(FIELD_DATA)
            .and_then(Value::as_array)
            .ok_or(ClaimDecodeError::MissingData)?;
        let data = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| DataNode::from_value(i, node))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            token: string(FIELD_TOKEN)?,
            subject: string(FIELD_SUBJECT)?,
            data,
            packed_data: string(FIELD_PACKED_DATA)?,
            signature: string(FIELD_SIGNATURE)?,
        })
    }

    /// The canonical `{data, token}` tree the claimant signed.
    pub fn signed_content(&self) -> CanonicalValue {
        CanonicalValue::Mapping(vec![
            (
                FIELD_DATA.to_string(),
                CanonicalValue::Sequence(self.data.iter().map(|n| n.content.clone()).collect()),
            ),
            (FIELD_TOKEN.to_string(), CanonicalValue::String(self.token.clone())),
        ])
        .canonicalize()
    }

    /// Recompute the content digest over the signed content.
    pub fn content_digest(&self) -> Result<ContentDigest, CanonicalizationError> {
        let bytes = CanonicalBytes::from_canonical(&self.signed_content())?;
        Ok(keccak256_digest(&bytes))
    }
}
