//! Application startup and lifecycle management.

use crate::config::LookupConfig;
use crate::handlers;
use crate::services::{HttpWeatherProvider, WeatherProvider};
use axum::middleware::from_fn;
use axum::{routing::get, Router};
use service_core::error::AppError;
use service_core::middleware::{metrics::metrics_middleware, tracing::request_id_middleware};
use service_core::observability::make_request_span;
use service_core::observability::metrics::metrics_endpoint;
use service_core::shutdown::shutdown_signal;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn WeatherProvider>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/weather", get(handlers::get_weather))
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(metrics_endpoint))
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build with the HTTP-backed providers from `config`.
    pub async fn build(config: LookupConfig) -> Result<Self, AppError> {
        let provider = HttpWeatherProvider::new(&config.providers)?;
        tracing::info!(
            viacep = %config.providers.viacep_base_url,
            weatherapi = %config.providers.weatherapi_base_url,
            timeout_secs = config.providers.timeout.as_secs(),
            "Weather providers initialized"
        );

        Self::build_with_provider(config, Arc::new(provider)).await
    }

    /// Build around any provider; port 0 binds a random port.
    pub async fn build_with_provider(
        config: LookupConfig,
        provider: Arc<dyn WeatherProvider>,
    ) -> Result<Self, AppError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Lookup service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            router: router(AppState { provider }),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until Ctrl+C or SIGTERM, then drain in-flight requests.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.run_until(shutdown_signal()).await
    }

    pub async fn run_until<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                e
            })?;

        tracing::info!("Lookup service stopped");
        Ok(())
    }
}
