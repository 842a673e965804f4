//! Cross-service workflow integration tests library.
//!
//! Runs gateway-service and lookup-service in-process on random ports, wired
//! to each other over real HTTP. The lookup service is backed either by a
//! scripted [`MockWeatherProvider`] or by its HTTP providers pointed at
//! wiremock stubs of the address and weather APIs.
//!
//! ## Usage
//!
//! ```bash
//! cargo test -p workflow-tests
//! ```

use anyhow::{anyhow, Result};
use gateway_service::config::{DownstreamConfig, GatewayConfig};
use lookup_service::config::{LookupConfig, ProvidersConfig};
use lookup_service::services::WeatherProvider;
use secrecy::Secret;
use serde_json::json;
use service_core::config::Config as CoreConfig;
use std::sync::{Arc, Once};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub use lookup_service::services::{MockWeatherProvider, ProviderError};
pub use service_core::observability::{REQUEST_ID_HEADER, TRACEPARENT_HEADER};

pub const SAO_PAULO_CEP: &str = "01001000";
pub const WEATHERAPI_KEY: &str = "workflow-test-key";

/// Bound the gateway places on its call to the lookup service.
pub const DOWNSTREAM_TIMEOUT: Duration = Duration::from_secs(5);

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,workflow_tests=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

fn core_config() -> CoreConfig {
    CoreConfig {
        port: 0,
        log_level: "debug".to_string(),
        otel_exporter_otlp_endpoint: None,
    }
}

fn spawn<F>(server: F)
where
    F: std::future::Future<Output = std::io::Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = server.await {
            tracing::error!("Test server stopped: {}", e);
        }
    });
}

/// Start lookup-service with the given provider; returns its base URL.
pub async fn spawn_lookup(provider: Arc<dyn WeatherProvider>) -> Result<String> {
    let config = LookupConfig {
        common: core_config(),
        providers: providers_config("http://127.0.0.1:1", "http://127.0.0.1:1"),
    };
    let app = lookup_service::Application::build_with_provider(config, provider)
        .await
        .map_err(|e| anyhow!("Failed to build lookup-service: {}", e))?;

    let url = format!("http://127.0.0.1:{}", app.port());
    spawn(app.run_until(std::future::pending()));
    Ok(url)
}

/// Start lookup-service with its HTTP providers aimed at the given bases.
pub async fn spawn_lookup_with_http_providers(
    viacep_base_url: &str,
    weatherapi_base_url: &str,
) -> Result<String> {
    let config = LookupConfig {
        common: core_config(),
        providers: providers_config(viacep_base_url, weatherapi_base_url),
    };
    let app = lookup_service::Application::build(config)
        .await
        .map_err(|e| anyhow!("Failed to build lookup-service: {}", e))?;

    let url = format!("http://127.0.0.1:{}", app.port());
    spawn(app.run_until(std::future::pending()));
    Ok(url)
}

/// Start gateway-service relaying to `lookup_url`; returns its base URL.
pub async fn spawn_gateway(lookup_url: &str, timeout: Duration) -> Result<String> {
    let config = GatewayConfig {
        common: core_config(),
        downstream: DownstreamConfig {
            lookup_service_url: lookup_url.to_string(),
            timeout,
        },
    };
    let app = gateway_service::Application::build(config)
        .await
        .map_err(|e| anyhow!("Failed to build gateway-service: {}", e))?;

    let url = format!("http://127.0.0.1:{}", app.port());
    spawn(app.run_until(std::future::pending()));
    Ok(url)
}

fn providers_config(viacep_base_url: &str, weatherapi_base_url: &str) -> ProvidersConfig {
    ProvidersConfig {
        weatherapi_key: Secret::new(WEATHERAPI_KEY.to_string()),
        viacep_base_url: viacep_base_url.to_string(),
        weatherapi_base_url: weatherapi_base_url.to_string(),
        timeout: Duration::from_secs(2),
    }
}

/// Wiremock stand-ins for the address and weather APIs.
pub struct ProviderStubs {
    pub viacep: MockServer,
    pub weatherapi: MockServer,
}

impl ProviderStubs {
    pub async fn start() -> Self {
        Self {
            viacep: MockServer::start().await,
            weatherapi: MockServer::start().await,
        }
    }

    pub async fn with_address(self, cep: &str, locality: &str) -> Self {
        Mock::given(method("GET"))
            .and(path(format!("/ws/{}/json/", cep)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "cep": cep,
                "localidade": locality
            })))
            .mount(&self.viacep)
            .await;
        self
    }

    pub async fn with_unknown_address(self, cep: &str) -> Self {
        Mock::given(method("GET"))
            .and(path(format!("/ws/{}/json/", cep)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"erro": "true"})))
            .mount(&self.viacep)
            .await;
        self
    }

    pub async fn with_temperature(self, locality: &str, temp_c: f64) -> Self {
        Mock::given(method("GET"))
            .and(path("/v1/current.json"))
            .and(query_param("key", WEATHERAPI_KEY))
            .and(query_param("q", locality))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "location": {"name": locality},
                "current": {"temp_c": temp_c}
            })))
            .mount(&self.weatherapi)
            .await;
        self
    }
}

/// Stand-in lookup service that answers every `/weather` call with `record`
/// and keeps the requests the gateway sent.
pub async fn recording_lookup(record: serde_json::Value) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(record))
        .mount(&server)
        .await;
    server
}

/// `traceparent` header of the first request `server` received.
pub async fn first_traceparent(server: &MockServer) -> Option<String> {
    let requests = server.received_requests().await?;
    let value = requests.first()?.headers.get(TRACEPARENT_HEADER)?;
    value.to_str().ok().map(str::to_string)
}

/// Both services running and wired together.
pub struct WorkflowTestContext {
    pub gateway_url: String,
    pub lookup_url: String,
    pub client: reqwest::Client,
}

impl WorkflowTestContext {
    /// Chain backed by a scripted provider.
    pub async fn with_provider(provider: Arc<MockWeatherProvider>) -> Result<Self> {
        init_tracing();

        let lookup_url = spawn_lookup(provider).await?;
        Self::with_lookup(lookup_url).await
    }

    /// Chain backed by the real HTTP providers against stubbed APIs.
    pub async fn with_provider_stubs(stubs: &ProviderStubs) -> Result<Self> {
        init_tracing();

        let lookup_url =
            spawn_lookup_with_http_providers(&stubs.viacep.uri(), &stubs.weatherapi.uri()).await?;
        Self::with_lookup(lookup_url).await
    }

    /// Gateway only, relaying to whatever listens at `lookup_url`.
    pub async fn with_lookup(lookup_url: String) -> Result<Self> {
        init_tracing();

        let gateway_url = spawn_gateway(&lookup_url, DOWNSTREAM_TIMEOUT).await?;
        let ctx = Self {
            gateway_url,
            lookup_url,
            client: reqwest::Client::new(),
        };
        ctx.wait_for_gateway(Duration::from_secs(5)).await?;
        Ok(ctx)
    }

    /// `POST /` on the gateway with a JSON body.
    pub async fn post_cep(&self, body: serde_json::Value) -> Result<reqwest::Response> {
        self.post_raw(body.to_string(), &[]).await
    }

    /// `POST /` on the gateway with a raw body and extra headers.
    pub async fn post_raw(
        &self,
        body: String,
        headers: &[(&str, &str)],
    ) -> Result<reqwest::Response> {
        let mut request = self
            .client
            .post(format!("{}/", self.gateway_url))
            .header("content-type", "application/json")
            .body(body);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        request
            .send()
            .await
            .map_err(|e| anyhow!("Failed to reach gateway-service: {}", e))
    }

    /// `GET /weather?cep=` on the lookup service directly.
    pub async fn get_weather(&self, cep: &str) -> Result<reqwest::Response> {
        self.get_weather_with_headers(cep, &[]).await
    }

    /// `GET /weather?cep=` on the lookup service with extra headers.
    pub async fn get_weather_with_headers(
        &self,
        cep: &str,
        headers: &[(&str, &str)],
    ) -> Result<reqwest::Response> {
        let mut request = self
            .client
            .get(format!("{}/weather", self.lookup_url))
            .query(&[("cep", cep)]);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        request
            .send()
            .await
            .map_err(|e| anyhow!("Failed to reach lookup-service: {}", e))
    }

    async fn wait_for_gateway(&self, timeout: Duration) -> Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        let url = format!("{}/health", self.gateway_url);

        loop {
            match self.client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => return Ok(()),
                _ if tokio::time::Instant::now() >= deadline => {
                    return Err(anyhow!("gateway-service not healthy after {:?}", timeout));
                }
                _ => tokio::time::sleep(Duration::from_millis(50)).await,
            }
        }
    }
}
