//! Weather provider client: locality to current temperature.

use super::{record_call, transport_error, ProviderError};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use service_core::observability::{TraceContext, TracedClientExt};

const PROVIDER: &str = "weatherapi";

#[derive(Clone)]
pub struct WeatherApiClient {
    client: Client,
    base_url: String,
    api_key: Secret<String>,
}

#[derive(Debug, Deserialize)]
struct CurrentWeatherResponse {
    current: CurrentConditions,
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    temp_c: f64,
}

impl WeatherApiClient {
    pub fn new(client: Client, base_url: &str, api_key: Secret<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Current temperature in Celsius for `locality`.
    pub async fn current_celsius(
        &self,
        locality: &str,
        cx: &TraceContext,
    ) -> Result<f64, ProviderError> {
        let result = self.fetch(locality, cx).await;
        record_call(PROVIDER, &result);
        result
    }

    async fn fetch(&self, locality: &str, cx: &TraceContext) -> Result<f64, ProviderError> {
        let url = format!("{}/v1/current.json", self.base_url);
        tracing::debug!(%locality, "Resolving temperature");

        let response = self
            .client
            .traced_get(&url, cx)
            .query(&[
                ("key", self.api_key.expose_secret().as_str()),
                ("q", locality),
            ])
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;

        let status = response.status();
        match status {
            s if s.is_success() => {}
            // Unknown locations are reported as 400 with an error body
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => {
                return Err(ProviderError::NotFound(format!(
                    "{} has no conditions for {}",
                    PROVIDER, locality
                )));
            }
            _ => {
                return Err(ProviderError::UpstreamUnavailable(format!(
                    "{} returned status {}",
                    PROVIDER, status
                )));
            }
        }

        let body: CurrentWeatherResponse = response.json().await.map_err(|e| {
            ProviderError::Decode(format!(
                "Failed to parse {} response: {}",
                PROVIDER,
                e.without_url()
            ))
        })?;

        let temp_c = body.current.temp_c;
        tracing::info!(%locality, temp_c, "Temperature resolved");
        Ok(temp_c)
    }
}
