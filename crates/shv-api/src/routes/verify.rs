//! # Share Claim Verification Route
//!
//! | Method | Path               | Outcome                                    |
//! |--------|--------------------|--------------------------------------------|
//! | POST   | `/v1/shares/verify`| 200 accepted, 422 rejected, 502 ledger down |

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shv_core::ValidationError;
use shv_verify::Verdict;
use utoipa::ToSchema;

use crate::error::{AppError, ErrorBody};
use crate::extractors::extract_json;
use crate::state::AppState;

/// Share claim as submitted by a claimant. Documented for OpenAPI; the
/// handler accepts any JSON and lets the shape stage report problems.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShareClaimRequest {
    /// Opaque correlation identifier.
    pub token: String,
    /// Claimed signer address.
    pub subject: String,
    /// Attested data nodes; each carries `layer2Hash`, `attester` and `tx`.
    pub data: Vec<Value>,
    /// `0x` Keccak-256 of the canonical `{data, token}`.
    pub packed_data: String,
    /// 65-byte recoverable signature over `packedData`, hex.
    pub signature: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AcceptedResponse {
    /// Always `accepted`.
    pub status: String,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RejectedResponse {
    /// Always `rejected`.
    pub status: String,
    /// Failing stage: `shape`, `offchain`, `payload` or `onchain`.
    pub stage: String,
    pub errors: Vec<ValidationErrorBody>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ValidationErrorBody {
    pub key: String,
    pub message: String,
}

impl From<ValidationError> for ValidationErrorBody {
    fn from(err: ValidationError) -> Self {
        Self {
            key: err.key,
            message: err.message,
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/shares/verify", post(verify_claim))
}

/// POST /v1/shares/verify — Verify a share claim.
#[utoipa::path(
    post,
    path = "/v1/shares/verify",
    request_body = ShareClaimRequest,
    responses(
        (status = 200, description = "Claim accepted", body = AcceptedResponse),
        (status = 400, description = "Body is not JSON", body = ErrorBody),
        (status = 422, description = "Claim rejected", body = RejectedResponse),
        (status = 502, description = "Ledger unavailable; claim not verified", body = ErrorBody),
    ),
    tag = "verification"
)]
pub(crate) async fn verify_claim(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, AppError> {
    let raw = extract_json(body)?;
    let verdict = state.verifier.verify(&raw).await?;

    Ok(match verdict {
        Verdict::Accepted { token } => (
            StatusCode::OK,
            Json(AcceptedResponse {
                status: "accepted".to_string(),
                token,
            }),
        )
            .into_response(),
        Verdict::Rejected { stage, errors } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(RejectedResponse {
                status: "rejected".to_string(),
                stage: stage.to_string(),
                errors: errors.into_iter().map(Into::into).collect(),
            }),
        )
            .into_response(),
    })
}
