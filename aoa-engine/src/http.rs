//! HTTP transport

use aoa_core::domain::call::{ParamBag, Procedure};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::ProcedureClient;
use crate::error::{EngineError, Result};

/// Calls procedures on an engine service
///
/// `POST {base_url}/procedures/{script}/{function}` with the parameter bag as
/// the JSON body; the JSON response body is the reply.
#[derive(Debug, Clone)]
pub struct HttpProcedureClient {
    /// Base URL of the engine service (e.g., "http://localhost:8000")
    base_url: String,
    client: Client,
}

impl HttpProcedureClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a client with a custom HTTP client (proxies, TLS settings, etc.)
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn procedure_url(&self, procedure: &Procedure) -> String {
        format!(
            "{}/procedures/{}/{}",
            self.base_url, procedure.script, procedure.function
        )
    }

    /// Check the status code and deserialize the JSON body
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(EngineError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| EngineError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}

#[async_trait]
impl ProcedureClient for HttpProcedureClient {
    async fn call(&self, procedure: &Procedure, params: &ParamBag) -> Result<Value> {
        let url = self.procedure_url(procedure);
        debug!(%procedure, %url, "Posting engine procedure");

        let response = self.client.post(&url).json(params).send().await?;
        self.handle_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = HttpProcedureClient::new("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_procedure_url() {
        let client = HttpProcedureClient::new("http://engine:8000");
        let url = client.procedure_url(&Procedure::new("ML_AOA.R", "training"));
        assert_eq!(url, "http://engine:8000/procedures/ML_AOA.R/training");
    }
}
