//! # Canonicalize Subcommand
//!
//! Prints the canonical serialization of a JSON document and its content
//! hash, the same bytes the verifier hashes when it recomputes `packedData`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

use shv_core::{canonicalize, keccak256_digest, CanonicalBytes};

/// Arguments for the `shv canonicalize` subcommand.
#[derive(Args, Debug)]
pub struct CanonicalizeArgs {
    /// JSON document to canonicalize.
    #[arg(long, value_name = "FILE")]
    pub input: PathBuf,
}

/// Execute the canonicalize subcommand.
pub fn run_canonicalize(args: &CanonicalizeArgs) -> Result<u8> {
    let value = crate::read_json(&args.input)?;
    let (canonical, hash) = canonical_form(&value)?;
    println!("{canonical}");
    println!("{hash}");
    Ok(crate::EXIT_OK)
}

/// Canonical JSON text and its `0x` Keccak-256.
pub fn canonical_form(value: &Value) -> Result<(String, String)> {
    let bytes = CanonicalBytes::from_canonical(&canonicalize(value))
        .context("failed to canonicalize document")?;
    let digest = keccak256_digest(&bytes);
    Ok((bytes.as_str().to_string(), digest.to_prefixed_hex()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_form_sorts_keys() {
        let (text, hash) = canonical_form(&json!({"b": 1, "a": [true, null]})).unwrap();
        assert_eq!(text, r#"{"a":[true,null],"b":1}"#);
        assert!(hash.starts_with("0x"));
        assert_eq!(hash.len(), 66);
    }

    #[test]
    fn canonical_form_ignores_input_key_order() {
        let a = canonical_form(&json!({"x": {"q": 1, "p": 2}, "y": "s"})).unwrap();
        let b = canonical_form(&json!({"y": "s", "x": {"p": 2, "q": 1}})).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_object_hash() {
        // keccak256("{}")
        let (text, hash) = canonical_form(&json!({})).unwrap();
        assert_eq!(text, "{}");
        assert_eq!(
            hash,
            "0xb48d38f93eaa084033fc5970bf96e559c33c4cdc07d889ab00b4d63f9590739d"
        );
    }

    #[test]
    fn run_canonicalize_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        std::fs::write(&path, r#"{"z": 0, "a": 1}"#).unwrap();
        let code = run_canonicalize(&CanonicalizeArgs { input: path }).unwrap();
        assert_eq!(code, crate::EXIT_OK);
    }

    #[test]
    fn run_canonicalize_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let args = CanonicalizeArgs {
            input: dir.path().join("absent.json"),
        };
        assert!(run_canonicalize(&args).is_err());
    }
}
