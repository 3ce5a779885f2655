//! # Validation Errors
//!
//! A `ValidationError` records one failed check: `key` names the claim field
//! or logical concern (`subject`, `packedData`, `TraitAttested`, ...) and
//! `message` carries the compared values for diagnosis. A stage that returns
//! an empty `Vec<ValidationError>` passed.

use serde::{Deserialize, Serialize};

/// One failed validation check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Field or concern that failed.
    pub key: String,
    /// Human-readable diagnostic context.
    pub message: String,
}

impl ValidationError {
    pub fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.key, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_key_and_message() {
        let err = ValidationError::new("subject", "mismatch");
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            serde_json::json!({"key": "subject", "message": "mismatch"})
        );
    }

    #[test]
    fn display_prefixes_key() {
        assert_eq!(ValidationError::new("token", "empty").to_string(), "token: empty");
    }
}
