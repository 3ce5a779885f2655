//! # OpenAPI Specification Assembly
//!
//! Serves the generated OpenAPI spec at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Share Verification Gate",
        version = "0.1.0",
        description = "Verifies share claims against their signed content and the attestations committed on the ledger.",
        license(name = "AGPL-3.0-or-later")
    ),
    paths(crate::routes::verify::verify_claim),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::routes::verify::ShareClaimRequest,
        crate::routes::verify::AcceptedResponse,
        crate::routes::verify::RejectedResponse,
        crate::routes::verify::ValidationErrorBody,
    )),
    tags((name = "verification", description = "Share claim verification"))
)]
pub struct ApiDoc;

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
