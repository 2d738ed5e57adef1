//! Engine configuration
//!
//! Defaults overlaid by `TANCHOR_*` environment variables, e.g.
//! `TANCHOR_REGISTRY_URL`, `TANCHOR_HTTP_TIMEOUT_SECS`.

use std::time::Duration;

use config::{Config, Environment};
use serde::Deserialize;
use tanchor_core::errors::{Result, TaError, TaErrorKind};
use tanchor_core::model::LOCAL_LOG_TARGET_ID;

pub const ENV_PREFIX: &str = "TANCHOR";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EngineConfig {
    pub registry_url: String,
    pub registry_page_limit: u32,
    pub chain_service_url: String,
    pub audit_url: String,
    #[serde(default)]
    pub public_log_url: Option<String>,
    pub instance_id: String,
    pub source_name: String,
    pub http_timeout_secs: u64,
    pub http_max_retries: u32,
    pub http_initial_backoff_ms: u64,
    pub http_max_backoff_ms: u64,
    pub db_path: String,
    pub default_target: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            registry_url: "http://issuer-registry:4030".to_string(),
            registry_page_limit: 10_000,
            chain_service_url: "http://forensics-api:4010".to_string(),
            audit_url: "http://forensics-api:4010".to_string(),
            public_log_url: None,
            instance_id: "anchor-1".to_string(),
            source_name: "transparency-anchor".to_string(),
            http_timeout_secs: 10,
            http_max_retries: 2,
            http_initial_backoff_ms: 200,
            http_max_backoff_ms: 2_000,
            db_path: ".tanchor/anchors.db".to_string(),
            default_target: LOCAL_LOG_TARGET_ID.to_string(),
        }
    }
}

impl EngineConfig {
    /// Load defaults, then apply `TANCHOR_*` overrides from the process
    /// environment.
    ///
    /// # Errors
    /// `ERR_CONFIGURATION` when an override cannot be parsed into its field.
    pub fn load() -> Result<Self> {
        let defaults = Self::default();
        let builder = Config::builder()
            .set_default("registry_url", defaults.registry_url)
            .and_then(|b| b.set_default("registry_page_limit", i64::from(defaults.registry_page_limit)))
            .and_then(|b| b.set_default("chain_service_url", defaults.chain_service_url))
            .and_then(|b| b.set_default("audit_url", defaults.audit_url))
            .and_then(|b| b.set_default("instance_id", defaults.instance_id))
            .and_then(|b| b.set_default("source_name", defaults.source_name))
            .and_then(|b| b.set_default("http_timeout_secs", clamp_i64(defaults.http_timeout_secs)))
            .and_then(|b| b.set_default("http_max_retries", i64::from(defaults.http_max_retries)))
            .and_then(|b| {
                b.set_default(
                    "http_initial_backoff_ms",
                    clamp_i64(defaults.http_initial_backoff_ms),
                )
            })
            .and_then(|b| b.set_default("http_max_backoff_ms", clamp_i64(defaults.http_max_backoff_ms)))
            .and_then(|b| b.set_default("db_path", defaults.db_path))
            .and_then(|b| b.set_default("default_target", defaults.default_target))
            .map_err(from_config)?;

        builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(from_config)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn clamp_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn from_config(err: config::ConfigError) -> TaError {
    TaError::new(TaErrorKind::Configuration)
        .with_op("config_load")
        .with_message(err.to_string())
}
