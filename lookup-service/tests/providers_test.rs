mod common;

use common::{test_config, SAO_PAULO_CEP, TRACEPARENT};
use lookup_service::services::{
    HttpWeatherProvider, ProviderError, ViaCepClient, WeatherApiClient, WeatherProvider,
};
use reqwest::header::HeaderMap;
use reqwest::Client;
use secrecy::Secret;
use serde_json::json;
use service_core::observability::{TraceContext, TRACEPARENT_HEADER};
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "super-secret-key";

fn remote_context() -> TraceContext {
    let mut headers = HeaderMap::new();
    headers.insert(TRACEPARENT_HEADER, TRACEPARENT.parse().unwrap());
    TraceContext::extract(&headers)
}

fn weather_client(base_url: &str) -> WeatherApiClient {
    WeatherApiClient::new(
        Client::builder()
            .timeout(Duration::from_millis(300))
            .build()
            .unwrap(),
        base_url,
        Secret::new(API_KEY.to_string()),
    )
}

async fn viacep_returning(template: ResponseTemplate) -> (MockServer, ViaCepClient) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ws/01001000/json/"))
        .respond_with(template)
        .mount(&server)
        .await;

    let client = ViaCepClient::new(Client::new(), &server.uri());
    (server, client)
}

#[tokio::test]
async fn viacep_resolves_locality() {
    let (_server, client) = viacep_returning(ResponseTemplate::new(200).set_body_json(json!({
        "cep": "01001-000",
        "logradouro": "Praça da Sé",
        "localidade": "São Paulo",
        "uf": "SP"
    })))
    .await;

    let locality = client
        .locality(SAO_PAULO_CEP, &TraceContext::default())
        .await
        .unwrap();
    assert_eq!(locality, "São Paulo");
}

#[tokio::test]
async fn viacep_forwards_trace_context() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ws/01001000/json/"))
        .and(header(TRACEPARENT_HEADER, TRACEPARENT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"localidade": "São Paulo"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = ViaCepClient::new(Client::new(), &server.uri());
    assert!(client.locality(SAO_PAULO_CEP, &remote_context()).await.is_ok());
}

#[tokio::test]
async fn viacep_error_flag_is_not_found() {
    for body in [json!({"erro": true}), json!({"erro": "true"})] {
        let (_server, client) =
            viacep_returning(ResponseTemplate::new(200).set_body_json(body)).await;

        let err = client
            .locality(SAO_PAULO_CEP, &TraceContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(_)), "{:?}", err);
    }
}

#[tokio::test]
async fn viacep_empty_locality_is_not_found() {
    let (_server, client) =
        viacep_returning(ResponseTemplate::new(200).set_body_json(json!({"localidade": ""})))
            .await;

    let err = client
        .locality(SAO_PAULO_CEP, &TraceContext::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::NotFound(_)));
}

#[tokio::test]
async fn viacep_bad_request_is_not_found() {
    let (_server, client) = viacep_returning(ResponseTemplate::new(400)).await;

    let err = client
        .locality(SAO_PAULO_CEP, &TraceContext::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::NotFound(_)));
}

#[tokio::test]
async fn viacep_server_error_is_unavailable() {
    let (_server, client) = viacep_returning(ResponseTemplate::new(503)).await;

    let err = client
        .locality(SAO_PAULO_CEP, &TraceContext::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::UpstreamUnavailable(_)));
}

#[tokio::test]
async fn viacep_malformed_body_is_decode_error() {
    let (_server, client) =
        viacep_returning(ResponseTemplate::new(200).set_body_string("<html>oops</html>")).await;

    let err = client
        .locality(SAO_PAULO_CEP, &TraceContext::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Decode(_)));
}

#[tokio::test]
async fn viacep_unreachable_is_unavailable() {
    let client = ViaCepClient::new(Client::new(), "http://127.0.0.1:1");

    let err = client
        .locality(SAO_PAULO_CEP, &TraceContext::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::UpstreamUnavailable(_)));
}

#[tokio::test]
async fn weatherapi_resolves_temperature() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/current.json"))
        .and(query_param("key", API_KEY))
        .and(query_param("q", "São Paulo"))
        .and(header(TRACEPARENT_HEADER, TRACEPARENT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "location": {"name": "Sao Paulo", "country": "Brazil"},
            "current": {"temp_c": 25.0, "temp_f": 77.0}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let temp_c = weather_client(&server.uri())
        .current_celsius("São Paulo", &remote_context())
        .await
        .unwrap();
    assert_eq!(temp_c, 25.0);
}

#[tokio::test]
async fn weatherapi_unknown_location_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/current.json"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 1006, "message": "No matching location found."}
        })))
        .mount(&server)
        .await;

    let err = weather_client(&server.uri())
        .current_celsius("Atlantis", &TraceContext::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::NotFound(_)));
}

#[tokio::test]
async fn weatherapi_malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/current.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"current": {}})))
        .mount(&server)
        .await;

    let err = weather_client(&server.uri())
        .current_celsius("São Paulo", &TraceContext::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Decode(_)));
    assert!(!err.to_string().contains(API_KEY));
}

#[tokio::test]
async fn weatherapi_slow_response_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/current.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"current": {"temp_c": 25.0}}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let err = weather_client(&server.uri())
        .current_celsius("São Paulo", &TraceContext::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::UpstreamUnavailable(_)));
    assert!(!err.to_string().contains(API_KEY));
}

#[tokio::test]
async fn weatherapi_transport_error_hides_api_key() {
    let err = weather_client("http://127.0.0.1:1")
        .current_celsius("São Paulo", &TraceContext::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::UpstreamUnavailable(_)));
    assert!(!err.to_string().contains(API_KEY));
}

#[tokio::test]
async fn http_provider_chains_both_lookups() {
    let viacep = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ws/01001000/json/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"localidade": "São Paulo"})))
        .expect(1)
        .mount(&viacep)
        .await;

    let weatherapi = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/current.json"))
        .and(query_param("key", "test-key"))
        .and(query_param("q", "São Paulo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"current": {"temp_c": 18.5}})))
        .expect(1)
        .mount(&weatherapi)
        .await;

    let config = test_config(&viacep.uri(), &weatherapi.uri());
    let provider = HttpWeatherProvider::new(&config.providers).unwrap();
    let cx = TraceContext::default();

    let locality = provider.resolve_locality(SAO_PAULO_CEP, &cx).await.unwrap();
    let temp_c = provider.resolve_temperature(&locality, &cx).await.unwrap();
    assert_eq!(locality, "São Paulo");
    assert_eq!(temp_c, 18.5);
}
