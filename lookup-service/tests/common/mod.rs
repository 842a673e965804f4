#![allow(dead_code)]

use lookup_service::config::{LookupConfig, ProvidersConfig};
use lookup_service::services::{MockWeatherProvider, WeatherProvider};
use lookup_service::startup::{router, AppState, Application};
use secrecy::Secret;
use service_core::config::Config as CoreConfig;
use std::sync::Arc;
use std::time::Duration;

pub const SAO_PAULO_CEP: &str = "01001000";
pub const TRACEPARENT: &str = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01";
pub const TRACE_ID: &str = "4bf92f3577b34da6a3ce929d0e0e4736";

pub fn test_config(viacep_base_url: &str, weatherapi_base_url: &str) -> LookupConfig {
    LookupConfig {
        common: CoreConfig {
            port: 0,
            log_level: "debug".to_string(),
            otel_exporter_otlp_endpoint: None,
        },
        providers: ProvidersConfig {
            weatherapi_key: Secret::new("test-key".to_string()),
            viacep_base_url: viacep_base_url.to_string(),
            weatherapi_base_url: weatherapi_base_url.to_string(),
            timeout: Duration::from_millis(500),
        },
    }
}

/// Provider that knows Praça da Sé in São Paulo at 25 °C.
pub fn sao_paulo_provider() -> MockWeatherProvider {
    MockWeatherProvider::new()
        .with_locality(SAO_PAULO_CEP, "São Paulo")
        .with_temperature("São Paulo", 25.0)
}

pub fn test_router(provider: Arc<MockWeatherProvider>) -> axum::Router {
    let provider: Arc<dyn WeatherProvider> = provider;
    router(AppState { provider })
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
}

impl TestApp {
    pub async fn spawn(provider: Arc<MockWeatherProvider>) -> Self {
        let config = test_config("http://127.0.0.1:1", "http://127.0.0.1:1");
        let app = Application::build_with_provider(config, provider)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        tokio::spawn(async move {
            app.run_until(std::future::pending()).await.ok();
        });

        TestApp {
            address: format!("http://127.0.0.1:{}", port),
            port,
        }
    }
}
