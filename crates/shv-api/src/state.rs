//! # Application State
//!
//! Shared state passed to route handlers via the `State` extractor. The
//! verifier is stateless between runs, so one instance behind an `Arc`
//! serves every request.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use shv_verify::{ConfigError, Verifier};

/// Maximum accepted request body size.
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Process-level settings.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub body_limit: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl AppConfig {
    /// Read `PORT` from the process environment, defaulting to 8080.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn load(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(raw) = lookup("PORT") {
            config.port = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                var: "PORT".into(),
                reason: format!("'{raw}' is not a port number"),
            })?;
        }
        Ok(config)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<Verifier>,
    pub config: AppConfig,
    /// Prometheus scrape handle; `/metrics` is mounted only when present.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(verifier: Verifier) -> Self {
        Self {
            verifier: Arc::new(verifier),
            config: AppConfig::default(),
            metrics: None,
        }
    }

    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("verifier", &self.verifier)
            .field("config", &self.config)
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}
