//! # Per-node Payload Validation
//!
//! The rules a node's opaque payload must satisfy are owned by whoever
//! defines the attestation schema, not by the verifier. They plug in through
//! [`PayloadValidator`]. Two implementations ship here:
//!
//! - [`AcceptAllPayloads`]: no payload rules configured.
//! - [`SchemaPayloadValidator`]: a JSON Schema (Draft 2020-12) applied to the
//!   full node object.

use std::path::Path;

use jsonschema::Validator;
use serde::Serialize;
use serde_json::Value;
use shv_core::{DataNode, ValidationError};

use crate::error::ConfigError;

/// External per-node integrity check.
pub trait PayloadValidator: Send + Sync {
    /// Validate the node at position `index` in the claim's `data`.
    fn validate(&self, index: usize, node: &DataNode) -> Vec<ValidationError>;
}

/// Result of validating one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodePayloadReport {
    pub layer2_hash: String,
    pub errors: Vec<ValidationError>,
}

impl NodePayloadReport {
    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Run `validator` over every node, in order. All nodes are checked.
pub fn validate_payloads(validator: &dyn PayloadValidator, nodes: &[DataNode]) -> Vec<NodePayloadReport> {
    nodes
        .iter()
        .enumerate()
        .map(|(i, node)| NodePayloadReport {
            layer2_hash: node.layer2_hash().to_string(),
            errors: validator.validate(i, node),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAllPayloads;

impl PayloadValidator for AcceptAllPayloads {
    fn validate(&self, _index: usize, _node: &DataNode) -> Vec<ValidationError> {
        Vec::new()
    }
}

/// JSON Schema payload rules.
///
/// Violations are keyed `data[i]` followed by the JSON pointer of the
/// offending value inside the node, e.g. `data[0]/payload/amount`.
pub struct SchemaPayloadValidator {
    validator: Validator,
}

impl std::fmt::Debug for SchemaPayloadValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaPayloadValidator").finish_non_exhaustive()
    }
}

impl SchemaPayloadValidator {
    pub fn new(schema: &Value) -> Result<Self, ConfigError> {
        let mut opts = jsonschema::options();
        opts.with_draft(jsonschema::Draft::Draft202012);
        let validator = opts
            .build(schema)
            .map_err(|e| ConfigError::PayloadSchema(e.to_string()))?;
        Ok(Self { validator })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let schema: Value = serde_json::from_str(&raw)
            .map_err(|e| ConfigError::PayloadSchema(format!("{}: {e}", path.display())))?;
        Self::new(&schema)
    }
}

impl PayloadValidator for SchemaPayloadValidator {
    fn validate(&self, index: usize, node: &DataNode) -> Vec<ValidationError> {
        let instance = node.content().to_json();
        self.validator
            .iter_errors(&instance)
            .map(|e| {
                ValidationError::new(
                    format!("data[{index}]{}", e.instance_path),
                    format!("node {}: {e}", node.layer2_hash()),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(index: usize, value: Value) -> DataNode {
        DataNode::from_value(index, &value).unwrap()
    }

    fn schema() -> Value {
        json!({
            "type": "object",
            "required": ["payload"],
            "properties": {
                "payload": {
                    "type": "object",
                    "required": ["amount"],
                    "properties": {"amount": {"type": "integer", "minimum": 0}}
                }
            }
        })
    }

    #[test]
    fn accept_all_passes_everything() {
        let nodes = vec![node(0, json!({"layer2Hash": "0x1", "attester": "0x2", "tx": "0x3"}))];
        let reports = validate_payloads(&AcceptAllPayloads, &nodes);
        assert_eq!(reports.len(), 1);
        assert!(reports[0].passed());
        assert_eq!(reports[0].layer2_hash, "0x1");
    }

    #[test]
    fn schema_violations_are_keyed_by_node_and_path() {
        let validator = SchemaPayloadValidator::new(&schema()).unwrap();
        let nodes = vec![
            node(0, json!({"layer2Hash": "0xa", "attester": "0x2", "tx": "0x3", "payload": {"amount": 5}})),
            node(1, json!({"layer2Hash": "0xb", "attester": "0x2", "tx": "0x3", "payload": {"amount": -1}})),
            node(2, json!({"layer2Hash": "0xc", "attester": "0x2", "tx": "0x3"})),
        ];
        let reports = validate_payloads(&validator, &nodes);
        assert!(reports[0].passed());
        assert_eq!(reports[1].errors.len(), 1);
        assert_eq!(reports[1].errors[0].key, "data[1]/payload/amount");
        assert!(reports[1].errors[0].message.contains("0xb"));
        assert_eq!(reports[2].errors.len(), 1);
        assert_eq!(reports[2].errors[0].key, "data[2]");
    }

    #[test]
    fn invalid_schema_is_config_error() {
        let err = SchemaPayloadValidator::new(&json!({"type": 12})).unwrap_err();
        assert!(matches!(err, ConfigError::PayloadSchema(_)));
    }
}
