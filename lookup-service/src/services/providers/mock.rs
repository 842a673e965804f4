use super::{ProviderError, WeatherProvider};
use async_trait::async_trait;
use service_core::observability::TraceContext;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Scripted provider for tests and local runs.
///
/// Unknown postal codes and localities resolve to `NotFound`. Each call
/// records the trace id it was handed, so tests can check propagation.
#[derive(Default)]
pub struct MockWeatherProvider {
    localities: HashMap<String, Result<String, ProviderError>>,
    temperatures: HashMap<String, Result<f64, ProviderError>>,
    locality_calls: AtomicU64,
    temperature_calls: AtomicU64,
    trace_ids: Mutex<Vec<Option<String>>>,
}

impl MockWeatherProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_locality(mut self, cep: &str, locality: &str) -> Self {
        self.localities
            .insert(cep.to_string(), Ok(locality.to_string()));
        self
    }

    pub fn with_locality_error(mut self, cep: &str, error: ProviderError) -> Self {
        self.localities.insert(cep.to_string(), Err(error));
        self
    }

    pub fn with_temperature(mut self, locality: &str, temp_c: f64) -> Self {
        self.temperatures.insert(locality.to_string(), Ok(temp_c));
        self
    }

    pub fn with_temperature_error(mut self, locality: &str, error: ProviderError) -> Self {
        self.temperatures.insert(locality.to_string(), Err(error));
        self
    }

    pub fn locality_calls(&self) -> u64 {
        self.locality_calls.load(Ordering::SeqCst)
    }

    pub fn temperature_calls(&self) -> u64 {
        self.temperature_calls.load(Ordering::SeqCst)
    }

    /// Trace ids seen by each call, in call order.
    pub fn trace_ids(&self) -> Vec<Option<String>> {
        self.trace_ids
            .lock()
            .map(|ids| ids.clone())
            .unwrap_or_default()
    }

    fn record_trace(&self, cx: &TraceContext) {
        if let Ok(mut ids) = self.trace_ids.lock() {
            ids.push(cx.trace_id().map(|id| id.to_string()));
        }
    }
}

#[async_trait]
impl WeatherProvider for MockWeatherProvider {
    async fn resolve_locality(
        &self,
        cep: &str,
        cx: &TraceContext,
    ) -> Result<String, ProviderError> {
        self.locality_calls.fetch_add(1, Ordering::SeqCst);
        self.record_trace(cx);

        tracing::info!(%cep, "[MOCK] Resolving locality");

        self.localities
            .get(cep)
            .cloned()
            .unwrap_or_else(|| Err(ProviderError::NotFound(format!("no address for {}", cep))))
    }

    async fn resolve_temperature(
        &self,
        locality: &str,
        cx: &TraceContext,
    ) -> Result<f64, ProviderError> {
        self.temperature_calls.fetch_add(1, Ordering::SeqCst);
        self.record_trace(cx);

        tracing::info!(%locality, "[MOCK] Resolving temperature");

        self.temperatures.get(locality).cloned().unwrap_or_else(|| {
            Err(ProviderError::NotFound(format!(
                "no conditions for {}",
                locality
            )))
        })
    }
}
