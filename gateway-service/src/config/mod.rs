use service_core::config::{self as core_config, get_env, get_env_parsed, is_prod};
use service_core::error::AppError;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub common: core_config::Config,
    pub downstream: DownstreamConfig,
}

#[derive(Debug, Clone)]
pub struct DownstreamConfig {
    /// Base URL of the lookup service, e.g. `http://lookup-service:8080`.
    pub lookup_service_url: String,
    /// Whole-call bound on `GET /weather`, connect through body.
    pub timeout: Duration,
}

impl GatewayConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load(DEFAULT_PORT)?;

        // The localhost default is for development only
        let lookup_service_url =
            get_env("WEATHER_SERVICE", Some("http://localhost:8080"), is_prod())?;
        if lookup_service_url.trim().is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "WEATHER_SERVICE is set but empty"
            )));
        }

        Ok(GatewayConfig {
            common,
            downstream: DownstreamConfig {
                lookup_service_url,
                timeout: Duration::from_millis(get_env_parsed("DOWNSTREAM_TIMEOUT_MS", 5000)?),
            },
        })
    }
}
