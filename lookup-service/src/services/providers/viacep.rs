//! Address provider client: postal code to locality.

use super::{record_call, transport_error, ProviderError};
use reqwest::Client;
use serde::Deserialize;
use service_core::observability::{TraceContext, TracedClientExt};

const PROVIDER: &str = "viacep";

#[derive(Clone)]
pub struct ViaCepClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ViaCepResponse {
    #[serde(default)]
    localidade: Option<String>,
    #[serde(default)]
    erro: Option<ErroFlag>,
}

/// The provider has sent the not-found flag both as a JSON bool and as the
/// string `"true"`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErroFlag {
    Bool(bool),
    Text(String),
}

impl ErroFlag {
    fn is_set(&self) -> bool {
        match self {
            ErroFlag::Bool(flag) => *flag,
            ErroFlag::Text(text) => text.eq_ignore_ascii_case("true"),
        }
    }
}

impl ViaCepClient {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Resolve a validated postal code to its locality name.
    pub async fn locality(&self, cep: &str, cx: &TraceContext) -> Result<String, ProviderError> {
        let result = self.fetch(cep, cx).await;
        record_call(PROVIDER, &result);
        result
    }

    async fn fetch(&self, cep: &str, cx: &TraceContext) -> Result<String, ProviderError> {
        let url = format!("{}/ws/{}/json/", self.base_url, cep);
        tracing::debug!(%cep, "Resolving locality");

        let response = self
            .client
            .traced_get(&url, cx)
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;

        let status = response.status();
        if status.is_client_error() {
            // Malformed codes come back as 400 rather than the `erro` flag
            return Err(ProviderError::NotFound(format!(
                "{} returned status {} for {}",
                PROVIDER, status, cep
            )));
        }
        if !status.is_success() {
            return Err(ProviderError::UpstreamUnavailable(format!(
                "{} returned status {}",
                PROVIDER, status
            )));
        }

        let body: ViaCepResponse = response.json().await.map_err(|e| {
            ProviderError::Decode(format!("Failed to parse {} response: {}", PROVIDER, e))
        })?;

        if body.erro.as_ref().is_some_and(ErroFlag::is_set) {
            return Err(ProviderError::NotFound(format!("no address for {}", cep)));
        }

        match body.localidade {
            Some(locality) if !locality.trim().is_empty() => {
                tracing::info!(%cep, %locality, "Locality resolved");
                Ok(locality)
            }
            _ => Err(ProviderError::NotFound(format!("empty locality for {}", cep))),
        }
    }
}
