mod common;

use common::{lookup_stub, TestApp};

#[tokio::test]
async fn health_check_works() {
    let lookup = lookup_stub().await;
    let app = TestApp::spawn(&lookup.uri()).await;

    let response = reqwest::get(format!("{}/health", app.address))
        .await
        .expect("Failed to execute request");
    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "gateway-service");
}

#[tokio::test]
async fn temperature_served_over_tcp() {
    let lookup = lookup_stub().await;
    let app = TestApp::spawn(&lookup.uri()).await;

    let response = reqwest::Client::new()
        .post(format!("{}/", app.address))
        .json(&serde_json::json!({"cep": "01001000"}))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["city"], "São Paulo");
    assert_eq!(body.as_object().map(|o| o.len()), Some(4));
}
