//! # shv-cli — Share Verification Command-Line Interface
//!
//! ## Subcommands
//!
//! - `shv verify` — Run the full verification pipeline over a claim file,
//!   against a live ledger or an offline log fixture.
//! - `shv canonicalize` — Print the canonical JSON of a document and its
//!   `0x` Keccak-256.
//! - `shv sign` — Assemble and sign a complete claim from a data array.
//! - `shv address` — Print the checksummed address of a private key.
//!
//! ## Exit Codes
//!
//! | Code | Meaning                                            |
//! |------|----------------------------------------------------|
//! | 0    | success (claim accepted)                           |
//! | 1    | claim rejected                                     |
//! | 2    | verification could not run (I/O, config, ledger)   |
//!
//! Handlers return `Result<u8>`; `main` maps errors to exit code 2.

pub mod canonicalize;
pub mod signing;
pub mod verify;

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

/// Exit code for an accepted claim or a successful command.
pub const EXIT_OK: u8 = 0;
/// Exit code for a rejected claim.
pub const EXIT_REJECTED: u8 = 1;
/// Exit code when a command could not complete.
pub const EXIT_FAILURE: u8 = 2;

/// Read and parse a JSON file.
pub fn read_json(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse JSON: {}", path.display()))
}
