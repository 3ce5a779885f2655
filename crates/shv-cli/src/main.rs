//! # shv CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use shv_cli::canonicalize::{run_canonicalize, CanonicalizeArgs};
use shv_cli::signing::{run_address, run_sign, AddressArgs, SignArgs};
use shv_cli::verify::{run_verify, VerifyArgs};
use shv_verify::VerifierConfig;

/// Share claim verification toolchain.
///
/// Verifies attested share claims against their signature, content hash,
/// payload schema and ledger events, and produces signed claims for testing.
#[derive(Parser, Debug)]
#[command(name = "shv", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Verify a share claim and print the verdict.
    Verify(VerifyArgs),

    /// Print the canonical JSON of a document and its Keccak-256.
    Canonicalize(CanonicalizeArgs),

    /// Build and sign a complete claim from a data array.
    Sign(SignArgs),

    /// Print the checksummed address of a private key.
    Address(AddressArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so verdict JSON on stdout stays parseable.
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Verify(args) => match VerifierConfig::from_env() {
            Ok(config) => run_verify(&args, config).await,
            Err(e) => Err(e.into()),
        },
        Commands::Canonicalize(args) => run_canonicalize(&args),
        Commands::Sign(args) => run_sign(&args),
        Commands::Address(args) => run_address(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(shv_cli::EXIT_FAILURE)
        }
    }
}
