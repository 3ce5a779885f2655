//! # shv-api — Binary Entry Point
//!
//! Loads the verifier configuration from the environment (see
//! `shv_verify::config`), installs the Prometheus recorder and serves the
//! API on `PORT` (default 8080).

use anyhow::Context;
use metrics_exporter_prometheus::PrometheusBuilder;
use shv_api::{AppConfig, AppState};
use shv_verify::VerifierConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let verifier_config = VerifierConfig::from_env().context("loading verifier configuration")?;
    let verifier = verifier_config
        .build_verifier()
        .context("building verifier")?;
    match &verifier.options().onchain {
        Some(onchain) => tracing::info!(
            endpoint = %onchain.endpoint,
            event = %onchain.event_name,
            hash_field = %onchain.hash_field,
            "on-chain cross-validation enabled"
        ),
        None => tracing::warn!("on-chain cross-validation disabled; verifying off-chain only"),
    }

    let metrics = PrometheusBuilder::new()
        .install_recorder()
        .context("installing Prometheus recorder")?;

    let config = AppConfig::from_env().context("loading server configuration")?;
    let port = config.port;
    let state = AppState::new(verifier)
        .with_config(config)
        .with_metrics(metrics);
    let app = shv_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("share verification gate listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// `RUST_LOG` filter (default `info`); `SHV_LOG_FORMAT=json` for JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("SHV_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
