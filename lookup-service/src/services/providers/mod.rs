pub mod mock;
pub mod viacep;
pub mod weatherapi;

use crate::config::ProvidersConfig;
use async_trait::async_trait;
use reqwest::Client;
use service_core::error::AppError;
use service_core::observability::TraceContext;
use thiserror::Error;

pub use mock::MockWeatherProvider;
pub use viacep::ViaCepClient;
pub use weatherapi::WeatherApiClient;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProviderError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

impl ProviderError {
    /// Label used on the `provider_calls_total` metric.
    pub fn metric_status(&self) -> &'static str {
        match self {
            ProviderError::NotFound(_) => "not_found",
            ProviderError::UpstreamUnavailable(_) => "unavailable",
            ProviderError::Decode(_) => "decode_error",
        }
    }
}

/// The two external lookups the weather endpoint chains together.
///
/// Every call receives the trace context of the step that makes it, so the
/// outbound request joins the caller's trace.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Locality (city) name for a validated postal code.
    async fn resolve_locality(&self, cep: &str, cx: &TraceContext)
    -> Result<String, ProviderError>;

    /// Current temperature in Celsius for a locality.
    async fn resolve_temperature(
        &self,
        locality: &str,
        cx: &TraceContext,
    ) -> Result<f64, ProviderError>;
}

/// Production provider backed by the address and weather HTTP APIs.
pub struct HttpWeatherProvider {
    locality: ViaCepClient,
    temperature: WeatherApiClient,
}

impl HttpWeatherProvider {
    pub fn new(config: &ProvidersConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            locality: ViaCepClient::new(client.clone(), &config.viacep_base_url),
            temperature: WeatherApiClient::new(
                client,
                &config.weatherapi_base_url,
                config.weatherapi_key.clone(),
            ),
        })
    }
}

#[async_trait]
impl WeatherProvider for HttpWeatherProvider {
    async fn resolve_locality(
        &self,
        cep: &str,
        cx: &TraceContext,
    ) -> Result<String, ProviderError> {
        self.locality.locality(cep, cx).await
    }

    async fn resolve_temperature(
        &self,
        locality: &str,
        cx: &TraceContext,
    ) -> Result<f64, ProviderError> {
        self.temperature.current_celsius(locality, cx).await
    }
}

/// Record one provider call outcome.
pub(crate) fn record_call<T>(provider: &'static str, result: &Result<T, ProviderError>) {
    let status = match result {
        Ok(_) => "success",
        Err(e) => e.metric_status(),
    };
    metrics::counter!("provider_calls_total", "provider" => provider, "status" => status)
        .increment(1);
}

/// Classify a transport-level failure.
pub(crate) fn transport_error(provider: &str, err: reqwest::Error) -> ProviderError {
    // The weather provider URL carries the API key in its query string.
    let err = err.without_url();
    ProviderError::UpstreamUnavailable(format!("{} request failed: {}", provider, err))
}
