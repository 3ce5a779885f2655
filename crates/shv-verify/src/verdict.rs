//! Verification outcomes.

use std::fmt;

use serde::{Deserialize, Serialize};
use shv_core::ValidationError;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Shape,
    Offchain,
    Payload,
    Onchain,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shape => "shape",
            Self::Offchain => "offchain",
            Self::Payload => "payload",
            Self::Onchain => "onchain",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal result of a verification run.
///
/// A rejection always carries the complete error sequence of the first
/// failing stage. Runs that could not be completed are not verdicts; they
/// surface as [`VerifyError`](crate::VerifyError).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verdict {
    Accepted { token: String },
    Rejected { stage: Stage, errors: Vec<ValidationError> },
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    /// Errors of the failing stage; empty when accepted.
    pub fn errors(&self) -> &[ValidationError] {
        match self {
            Self::Accepted { .. } => &[],
            Self::Rejected { errors, .. } => errors,
        }
    }

    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Accepted { .. } => None,
            Self::Rejected { stage, .. } => Some(*stage),
        }
    }
}
