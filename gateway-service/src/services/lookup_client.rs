//! HTTP client for lookup-service `GET /weather`.

use reqwest::Client;
use service_core::models::WeatherRecord;
use service_core::observability::{TraceContext, TracedClientExt};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownstreamError {
    #[error("lookup service did not answer within {0:?}")]
    Timeout(Duration),

    #[error("lookup service unreachable: {0}")]
    Transport(String),

    #[error("lookup service returned status {0}")]
    Status(u16),

    #[error("lookup service sent an unreadable body: {0}")]
    Decode(String),
}

impl DownstreamError {
    fn metric_status(&self) -> &'static str {
        match self {
            DownstreamError::Timeout(_) => "timeout",
            DownstreamError::Transport(_) => "unreachable",
            DownstreamError::Status(_) => "error_status",
            DownstreamError::Decode(_) => "decode_error",
        }
    }
}

#[derive(Clone)]
pub struct LookupClient {
    client: Client,
    weather_url: String,
    timeout: Duration,
}

impl LookupClient {
    pub fn new(client: Client, base_url: &str, timeout: Duration) -> Self {
        Self {
            client,
            weather_url: format!("{}/weather", base_url.trim_end_matches('/')),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch the weather record for an already validated postal code.
    ///
    /// Anything other than a 200 with a well-formed record is an error; the
    /// lookup service's status is reported but never relayed.
    pub async fn fetch_weather(
        &self,
        cep: &str,
        cx: &TraceContext,
        request_id: Option<&str>,
    ) -> Result<WeatherRecord, DownstreamError> {
        let result = self.fetch(cep, cx, request_id).await;

        let status = match &result {
            Ok(_) => "success",
            Err(e) => e.metric_status(),
        };
        metrics::counter!("downstream_calls_total", "status" => status).increment(1);

        result
    }

    async fn fetch(
        &self,
        cep: &str,
        cx: &TraceContext,
        request_id: Option<&str>,
    ) -> Result<WeatherRecord, DownstreamError> {
        tracing::debug!(%cep, url = %self.weather_url, "Calling lookup service");

        let response = self
            .client
            .traced_get(&self.weather_url, cx)
            .query(&[("cep", cep)])
            .timeout(self.timeout)
            .send_with_request_id(request_id)
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(DownstreamError::Status(status.as_u16()));
        }

        let record: WeatherRecord = response.json().await.map_err(|e| {
            if e.is_timeout() {
                DownstreamError::Timeout(self.timeout)
            } else {
                DownstreamError::Decode(e.to_string())
            }
        })?;

        tracing::info!(%cep, city = %record.city, "Lookup service answered");
        Ok(record)
    }

    fn classify(&self, err: reqwest::Error) -> DownstreamError {
        if err.is_timeout() {
            DownstreamError::Timeout(self.timeout)
        } else {
            DownstreamError::Transport(err.to_string())
        }
    }
}
