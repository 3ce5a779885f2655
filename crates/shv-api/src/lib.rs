//! # shv-api — HTTP Surface for the Share Verification Gate
//!
//! ## API Surface
//!
//! | Path                 | Module                  | Purpose                     |
//! |----------------------|-------------------------|-----------------------------|
//! | `/v1/shares/verify`  | [`routes::verify`]      | Verify a share claim        |
//! | `/openapi.json`      | [`openapi`]             | Generated OpenAPI spec      |
//! | `/metrics`           | (this module)           | Prometheus scrape endpoint  |
//! | `/health/*`          | (this module)           | Kubernetes probes           |
//!
//! ## Status Mapping
//!
//! | Outcome                     | Status |
//! |-----------------------------|--------|
//! | claim accepted              | 200    |
//! | body is not JSON            | 400    |
//! | body over limit             | 413    |
//! | claim rejected              | 422    |
//! | ledger lookup failed        | 502    |
//! | any other internal failure  | 500    |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → RequestBodyLimitLayer → Handler
//! ```

pub mod error;
pub mod extractors;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

pub use error::AppError;
pub use state::{AppConfig, AppState};

/// Assemble the application router.
///
/// Health probes are mounted outside the body limit and tracing layers.
pub fn app(state: AppState) -> Router {
    let mut api = Router::new()
        .merge(routes::verify::router())
        .merge(openapi::router());
    if state.metrics.is_some() {
        api = api.route("/metrics", get(prometheus_metrics));
    }
    let api = api
        .layer(RequestBodyLimitLayer::new(state.config.body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness));

    Router::new().merge(health).merge(api)
}

/// Liveness probe — always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe — the verifier holds no connections, so it is ready as
/// soon as it is constructed.
async fn readiness() -> &'static str {
    "ready"
}

/// GET /metrics — Prometheus text exposition.
async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = state.metrics.as_ref().map(|h| h.render()).unwrap_or_default();
    ([(CONTENT_TYPE, "text/plain; version=0.0.4")], body)
}
