//! # Custom Extractors
//!
//! Claims are accepted as untyped JSON; the verifier's shape stage owns all
//! structural checks. The only extraction failure is a body that is not
//! JSON at all.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::Json;

use crate::error::AppError;

/// Extract a JSON body, mapping rejections to [`AppError::BadRequest`] or
/// [`AppError::PayloadTooLarge`].
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result.map(|Json(v)| v).map_err(|err| {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(err.body_text())
        } else {
            AppError::BadRequest(err.body_text())
        }
    })
}
