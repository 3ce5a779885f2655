//! # Sign and Address Subcommands
//!
//! Claimant-side tooling: assemble a complete claim from a data array and
//! a secp256k1 key, or print the address a key signs as. Used to produce
//! fixtures for the verifier.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use serde_json::{json, Value};

use shv_core::claim::{FIELD_PACKED_DATA, FIELD_SIGNATURE};
use shv_core::ShareClaim;
use shv_crypto::Secp256k1KeyPair;
use shv_verify::SignedMessage;

/// Arguments for the `shv sign` subcommand.
#[derive(Args, Debug)]
pub struct SignArgs {
    /// Private key, 32 bytes hex (with or without `0x`).
    #[arg(long)]
    pub key: String,
    /// Claim token.
    #[arg(long)]
    pub token: String,
    /// JSON file holding the `data` array.
    #[arg(long, value_name = "FILE")]
    pub data: PathBuf,
    /// Sign the `packedData` text (`text`) or the bytes it encodes (`hash_bytes`).
    #[arg(long, default_value = "text")]
    pub message: SignedMessage,
}

/// Arguments for the `shv address` subcommand.
#[derive(Args, Debug)]
pub struct AddressArgs {
    /// Private key, 32 bytes hex (with or without `0x`).
    #[arg(long)]
    pub key: String,
}

pub fn run_sign(args: &SignArgs) -> Result<u8> {
    let key = Secp256k1KeyPair::from_hex(&args.key).context("invalid private key")?;
    let data = crate::read_json(&args.data)?;
    let claim = build_claim(&key, &args.token, data, args.message)?;
    println!("{}", serde_json::to_string_pretty(&claim)?);
    Ok(crate::EXIT_OK)
}

pub fn run_address(args: &AddressArgs) -> Result<u8> {
    let key = Secp256k1KeyPair::from_hex(&args.key).context("invalid private key")?;
    println!("{}", key.address());
    Ok(crate::EXIT_OK)
}

/// Build a signed claim whose `subject` is the key's address.
pub fn build_claim(
    key: &Secp256k1KeyPair,
    token: &str,
    data: Value,
    mode: SignedMessage,
) -> Result<Value> {
    if !data.is_array() {
        bail!("data must be a JSON array of attestation nodes");
    }
    let mut claim = json!({
        "token": token,
        "subject": key.address().to_checksum(),
        "data": data,
        "packedData": "",
        "signature": "",
    });
    let packed = ShareClaim::from_value(&claim)
        .context("data nodes need string layer2Hash, attester and tx")?
        .content_digest()
        .context("failed to canonicalize claim content")?
        .to_prefixed_hex();
    let message = mode
        .message_bytes(&packed)
        .context("packedData is not hex")?;
    let signature = key
        .sign_message(&message)
        .context("failed to sign packedData")?;

    claim[FIELD_SIGNATURE] = Value::String(signature.to_hex());
    claim[FIELD_PACKED_DATA] = Value::String(packed);
    Ok(claim)
}
