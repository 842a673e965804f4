#![allow(dead_code)]

use gateway_service::config::{DownstreamConfig, GatewayConfig};
use gateway_service::services::LookupClient;
use gateway_service::startup::{router, AppState, Application};
use serde_json::json;
use service_core::config::Config as CoreConfig;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const SAO_PAULO_CEP: &str = "01001000";
pub const TRACEPARENT: &str = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01";
pub const TRACE_ID: &str = "4bf92f3577b34da6a3ce929d0e0e4736";

pub fn test_config(lookup_service_url: &str, timeout: Duration) -> GatewayConfig {
    GatewayConfig {
        common: CoreConfig {
            port: 0,
            log_level: "debug".to_string(),
            otel_exporter_otlp_endpoint: None,
        },
        downstream: DownstreamConfig {
            lookup_service_url: lookup_service_url.to_string(),
            timeout,
        },
    }
}

pub fn test_router(lookup_service_url: &str, timeout: Duration) -> axum::Router {
    router(AppState {
        lookup: LookupClient::new(reqwest::Client::new(), lookup_service_url, timeout),
    })
}

pub fn sao_paulo_record() -> serde_json::Value {
    json!({"city": "São Paulo", "temp_C": 25.0, "temp_F": 77.0, "temp_K": 298.0})
}

/// Lookup service stand-in answering the São Paulo code.
pub async fn lookup_stub() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("cep", SAO_PAULO_CEP))
        .respond_with(ResponseTemplate::new(200).set_body_json(sao_paulo_record()))
        .mount(&server)
        .await;
    server
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
}

impl TestApp {
    pub async fn spawn(lookup_service_url: &str) -> Self {
        let app = Application::build(test_config(lookup_service_url, Duration::from_secs(5)))
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
