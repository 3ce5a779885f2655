//! # Verify Subcommand
//!
//! Runs the verification pipeline over a claim file and prints the verdict
//! as JSON. The ledger is either the configured JSON-RPC endpoint or, with
//! `--logs`, an offline fixture mapping transaction ids to decoded events:
//!
//! ```json
//! { "0xabc…": [ { "name": "TraitAttested", "fields": { "subject": "0x…" } } ] }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Args;
use url::Url;

use shv_ledger::StaticLogSource;
use shv_verify::{Verdict, Verifier, VerifierConfig, VerifyOptions};

/// Arguments for the `shv verify` subcommand.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Claim JSON file.
    #[arg(long, value_name = "FILE")]
    pub claim: PathBuf,

    /// JSON-RPC endpoint; overrides `SHV_LEDGER_URL`.
    #[arg(long, conflicts_with_all = ["logs", "offchain_only"])]
    pub ledger_url: Option<String>,

    /// Offline log fixture used instead of a ledger endpoint.
    #[arg(long, value_name = "FILE", conflicts_with = "offchain_only")]
    pub logs: Option<PathBuf>,

    /// Skip on-chain cross-validation.
    #[arg(long)]
    pub offchain_only: bool,
}

/// Execute the verify subcommand with the environment-derived config.
pub async fn run_verify(args: &VerifyArgs, config: VerifierConfig) -> Result<u8> {
    let raw = crate::read_json(&args.claim)?;
    let verifier = build_verifier(args, config)?;

    let verdict = verifier.verify(&raw).await.context("verification could not complete")?;
    println!("{}", serde_json::to_string_pretty(&verdict)?);

    Ok(exit_code(&verdict))
}

pub fn exit_code(verdict: &Verdict) -> u8 {
    if verdict.is_accepted() {
        crate::EXIT_OK
    } else {
        crate::EXIT_REJECTED
    }
}

/// Resolve the ledger the command line asks for on top of `config`.
pub fn build_verifier(args: &VerifyArgs, mut config: VerifierConfig) -> Result<Verifier> {
    if args.offchain_only {
        tracing::info!("on-chain cross-validation disabled");
        let payloads = config.payload_validator()?;
        return Ok(
            Verifier::new(
                VerifyOptions::offchain_only().with_signed_message(config.signed_message),
                Arc::new(StaticLogSource::new()),
            )
            .with_payload_validator(payloads),
        );
    }

    if let Some(path) = &args.logs {
        let source = StaticLogSource::from_json_file(path)?;
        config.onchain = Some(true);
        config.ledger_url = Some(fixture_url(path)?.to_string());
        tracing::info!(fixture = %path.display(), "verifying against offline log fixture");
        let options = config.verify_options()?;
        let payloads = config.payload_validator()?;
        return Ok(Verifier::new(options, Arc::new(source)).with_payload_validator(payloads));
    }

    if let Some(url) = &args.ledger_url {
        config.onchain = Some(true);
        config.ledger_url = Some(url.clone());
    }
    let verifier = config.build_verifier()?;
    if let Some(onchain) = &verifier.options().onchain {
        tracing::info!(endpoint = %onchain.endpoint, "verifying against ledger");
    }
    Ok(verifier)
}

/// `file://` URL naming the fixture; it stands in for the ledger endpoint.
fn fixture_url(path: &Path) -> Result<Url> {
    let absolute = std::fs::canonicalize(path)
        .with_context(|| format!("failed to resolve {}", path.display()))?;
    Url::from_file_path(&absolute)
        .map_err(|()| anyhow!("cannot express {} as a URL", absolute.display()))
}
