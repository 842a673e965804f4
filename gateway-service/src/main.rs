use gateway_service::config::GatewayConfig;
use gateway_service::startup::Application;
use service_core::observability::metrics::init_metrics;
use service_core::observability::{init_tracing, shutdown_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = GatewayConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;

    init_tracing(
        "gateway-service",
        &config.common.log_level,
        config.common.otel_exporter_otlp_endpoint.as_deref(),
    );
    init_metrics();

    let app = Application::build(config).await?;
    let result = app.run_until_stopped().await;

    shutdown_tracing();
    result?;
    Ok(())
}
