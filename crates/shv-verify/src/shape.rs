//! # Request Shape Validator
//!
//! Presence and primitive-type checks on the raw claim, run before the claim
//! is decoded into [`ShareClaim`](shv_core::ShareClaim). Every check is
//! independent; one error is produced per failing field.
//!
//! | Field        | Rule                                      |
//! |--------------|-------------------------------------------|
//! | `token`      | string, non-empty after trimming          |
//! | `subject`    | string, non-empty after trimming          |
//! | `data`       | array with at least one element           |
//! | `packedData` | string, non-empty after trimming          |
//! | `signature`  | string, non-empty after trimming          |
//!
//! Each element of `data` must also be an object carrying non-empty string
//! `layer2Hash`, `attester` and `tx`. Node errors are keyed `data[i]` or
//! `data[i].<field>` and follow the top-level `data` position in the output.

use serde_json::Value;
use shv_core::claim::{
    FIELD_DATA, FIELD_PACKED_DATA, FIELD_SIGNATURE, FIELD_SUBJECT, FIELD_TOKEN, NODE_ATTESTER,
    NODE_LAYER2_HASH, NODE_TX,
};
use shv_core::ValidationError;

const NODE_FIELDS: [&str; 3] = [NODE_LAYER2_HASH, NODE_ATTESTER, NODE_TX];

/// Validate the shape of a raw claim. An empty result means the claim can be
/// decoded.
pub fn validate_shape(raw: &Value) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    check_string(raw.get(FIELD_TOKEN), FIELD_TOKEN, &mut errors);
    check_string(raw.get(FIELD_SUBJECT), FIELD_SUBJECT, &mut errors);
    check_data(raw.get(FIELD_DATA), &mut errors);
    check_string(raw.get(FIELD_PACKED_DATA), FIELD_PACKED_DATA, &mut errors);
    check_string(raw.get(FIELD_SIGNATURE), FIELD_SIGNATURE, &mut errors);
    errors
}

fn check_string(value: Option<&Value>, key: &str, errors: &mut Vec<ValidationError>) {
    match value {
        None | Some(Value::Null) => errors.push(ValidationError::new(key, format!("{key} is required"))),
        Some(Value::String(s)) if s.trim().is_empty() => {
            errors.push(ValidationError::new(key, format!("{key} must not be empty")))
        }
        Some(Value::String(_)) => {}
        Some(other) => errors.push(ValidationError::new(
            key,
            format!("{key} must be a string, got {}", type_name(other)),
        )),
    }
}

fn check_data(value: Option<&Value>, errors: &mut Vec<ValidationError>) {
    let nodes = match value {
        Some(Value::Array(nodes)) if !nodes.is_empty() => nodes,
        Some(Value::Array(_)) => {
            errors.push(ValidationError::new(FIELD_DATA, "data must contain at least one node"));
            return;
        }
        None | Some(Value::Null) => {
            errors.push(ValidationError::new(FIELD_DATA, "data is required"));
            return;
        }
        Some(other) => {
            errors.push(ValidationError::new(
                FIELD_DATA,
                format!("data must be an array, got {}", type_name(other)),
            ));
            return;
        }
    };

    for (i, node) in nodes.iter().enumerate() {
        if !node.is_object() {
            errors.push(ValidationError::new(
                format!("data[{i}]"),
                format!("data node must be an object, got {}", type_name(node)),
            ));
            continue;
        }
        for field in NODE_FIELDS {
            check_string(node.get(field), &format!("data[{i}].{field}"), errors);
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
