use secrecy::Secret;
use service_core::config::{self as core_config, get_env, get_env_parsed};
use service_core::error::AppError;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct LookupConfig {
    pub common: core_config::Config,
    pub providers: ProvidersConfig,
}

#[derive(Debug, Clone)]
pub struct ProvidersConfig {
    /// Pre-shared key for the weather provider.
    pub weatherapi_key: Secret<String>,
    pub viacep_base_url: String,
    pub weatherapi_base_url: String,
    /// Bound on each provider call, connect through body.
    pub timeout: Duration,
}

impl LookupConfig {
    /// Fails when `WEATHERAPI_KEY` is unset or blank.
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load(DEFAULT_PORT)?;
        let weatherapi_key = weatherapi_key(std::env::var("WEATHERAPI_KEY").ok())?;

        Ok(LookupConfig {
            common,
            providers: ProvidersConfig {
                weatherapi_key,
                viacep_base_url: get_env(
                    "VIACEP_BASE_URL",
                    Some("https://viacep.com.br"),
                    false,
                )?,
                weatherapi_base_url: get_env(
                    "WEATHERAPI_BASE_URL",
                    Some("https://api.weatherapi.com"),
                    false,
                )?,
                timeout: Duration::from_secs(get_env_parsed("PROVIDER_TIMEOUT_SECS", 10)?),
            },
        })
    }
}

/// The provider key has no default in any environment.
fn weatherapi_key(raw: Option<String>) -> Result<Secret<String>, AppError> {
    match raw {
        None => Err(AppError::ConfigError(anyhow::anyhow!(
            "WEATHERAPI_KEY is required but not set"
        ))),
        Some(key) if key.trim().is_empty() => Err(AppError::ConfigError(anyhow::anyhow!(
            "WEATHERAPI_KEY is set but empty"
        ))),
        Some(key) => Ok(Secret::new(key)),
    }
}
