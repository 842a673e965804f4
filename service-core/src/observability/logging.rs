use opentelemetry::KeyValue;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{Resource, runtime, trace as sdktrace};
use tracing::Subscriber;
use tracing_subscriber::{Registry, layer::SubscriberExt, util::SubscriberInitExt};

fn resource(service_name: &str) -> Resource {
    Resource::new(vec![KeyValue::new(
        "service.name",
        service_name.to_string(),
    )])
}

/// Install the global subscriber: env filter, OpenTelemetry layer and JSON
/// log lines.
///
/// With an `otlp_endpoint` spans are batched to the collector. Without one, or
/// if the exporter cannot be built, ids are still minted and propagated but
/// nothing is exported.
pub fn init_tracing(service_name: &str, log_level: &str, otlp_endpoint: Option<&str>) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let tracer = build_tracer(service_name, otlp_endpoint);
    let telemetry = tracing_opentelemetry::layer().with_tracer(tracer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(telemetry)
        .with(
            tracing_subscriber::fmt::layer()
                .with_file(true)
                .with_line_number(true)
                .json()
                .flatten_event(true),
        )
        .init();

    match otlp_endpoint {
        Some(endpoint) => tracing::info!(%endpoint, "Span export enabled"),
        None => tracing::info!("No OTLP endpoint configured, span export disabled"),
    }
}

fn build_tracer(service_name: &str, otlp_endpoint: Option<&str>) -> sdktrace::Tracer {
    let Some(endpoint) = otlp_endpoint else {
        return install_local_provider(service_name);
    };

    let otlp_exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(endpoint);

    match opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(otlp_exporter)
        .with_trace_config(sdktrace::config().with_resource(resource(service_name)))
        .install_batch(runtime::Tokio)
    {
        Ok(tracer) => tracer,
        Err(e) => {
            eprintln!(
                "Failed to initialize OTLP tracer for service '{}' at endpoint '{}': {}; spans will not be exported",
                service_name, endpoint, e
            );
            install_local_provider(service_name)
        }
    }
}

fn install_local_provider(service_name: &str) -> sdktrace::Tracer {
    let provider = local_provider(service_name);
    let tracer = provider.tracer(service_name.to_string());
    let _ = opentelemetry::global::set_tracer_provider(provider);
    tracer
}

/// Tracer provider with no exporter.
pub fn local_provider(service_name: &str) -> sdktrace::TracerProvider {
    sdktrace::TracerProvider::builder()
        .with_config(sdktrace::config().with_resource(resource(service_name)))
        .build()
}

/// Registry with only the OpenTelemetry layer, for scoped use with
/// `tracing::subscriber::set_default`.
pub fn otel_subscriber(tracer: sdktrace::Tracer) -> impl Subscriber + Send + Sync + 'static {
    Registry::default().with(tracing_opentelemetry::layer().with_tracer(tracer))
}

/// Flush pending spans and shut the tracer provider down.
pub fn shutdown_tracing() {
    opentelemetry::global::shutdown_tracer_provider();
}
