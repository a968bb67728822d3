//! API client module
//!
//! HTTP client for communicating with the AOA server.

use std::path::Path;

use anyhow::{Context, Result};
use aoa_core::dto::start::{StartRequest, StartResponse};
use aoa_core::dto::upload::{
    DeleteFilesRequest, DeleteFilesResponse, UploadRejection, UploadResponse,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};

/// Server answer to an upload
#[derive(Debug)]
pub enum UploadReply {
    Accepted(UploadResponse),
    Rejected(UploadRejection),
}

/// HTTP client for the AOA server API
pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    /// Create a new API client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the server
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    /// Trigger a pipeline run
    ///
    /// # Returns
    /// The status code together with the stage report. The report is
    /// returned for failed runs too (401, 402, 403).
    pub async fn start(&self, req: &StartRequest) -> Result<(StatusCode, StartResponse)> {
        let url = format!("{}/start", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(req)
            .send()
            .await
            .context("Failed to send start request")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read start response")?;

        match serde_json::from_str(&body) {
            Ok(report) => Ok((status, report)),
            Err(_) => anyhow::bail!("Request failed with status {}: {}", status, body),
        }
    }

    /// Upload a training-data or model file
    pub async fn upload(&self, path: &Path) -> Result<UploadReply> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .with_context(|| format!("Invalid file name: {}", path.display()))?
            .to_string();
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name));

        let url = format!("{}/upload", self.base_url);
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .context("Failed to send upload request")?;

        if response.status() == StatusCode::UNAUTHORIZED {
            let rejection = response
                .json()
                .await
                .context("Failed to parse upload rejection")?;
            return Ok(UploadReply::Rejected(rejection));
        }

        self.handle_response(response)
            .await
            .map(UploadReply::Accepted)
    }

    /// Delete every upload except `keep`
    pub async fn delete_files(&self, keep: Option<String>) -> Result<DeleteFilesResponse> {
        let url = format!("{}/deleteFiles", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&DeleteFilesRequest { file: keep })
            .send()
            .await
            .context("Failed to send delete files request")?;

        self.handle_response(response).await
    }

    /// Check that the server is up
    pub async fn health(&self) -> Result<String> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to send health request")?;

        if !response.status().is_success() {
            anyhow::bail!("Server unhealthy: status {}", response.status());
        }

        response
            .text()
            .await
            .context("Failed to read health response")
    }

    /// Handle API response and deserialize JSON
    ///
    /// # Arguments
    /// * `response` - The HTTP response
    ///
    /// # Returns
    /// The deserialized response body
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Request failed with status {}: {}", status, error_text);
        }

        response
            .json()
            .await
            .context("Failed to parse response JSON")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report(status: &str) -> serde_json::Value {
        json!({
            "runId": "00000000-0000-0000-0000-000000000000",
            "stac": {
                "aoi": {"status": "error", "message": "no matching items for date range/location", "code": "1"},
                "trainingData": {"status": "ok", "summary": "imagery created"},
                "status": "error"
            },
            "aoa": {
                "training": {"status": "not_executed", "reason": "imagery acquisition failed"},
                "classifyAndAOA": {"status": "not_executed", "reason": "imagery acquisition failed"},
                "status": "error"
            },
            "status": status
        })
    }

    #[tokio::test]
    async fn test_start_returns_report_for_failed_run() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/start")
            .with_status(402)
            .with_header("content-type", "application/json")
            .with_body(report("error").to_string())
            .create_async()
            .await;

        let client = ApiClient::new(&server.url());
        let (status, report) = client.start(&StartRequest::default()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
        assert_eq!(report.stac.aoi.code(), Some("1"));
        assert!(report.aoa.classify_and_aoa.is_not_executed());
    }

    #[tokio::test]
    async fn test_start_bad_request() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/start")
            .with_status(400)
            .with_body(r#"{"error":"missing required field `startDate`"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url());
        let err = client.start(&StartRequest::default()).await.unwrap_err();

        assert!(err.to_string().contains("400"));
        assert!(err.to_string().contains("startDate"));
    }

    #[tokio::test]
    async fn test_delete_files_sends_keep() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/deleteFiles")
            .match_body(mockito::Matcher::Json(json!({"file": "polygons.gpkg"})))
            .with_status(200)
            .with_body(r#"{"text":"The files were deleted successfully"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&format!("{}/", server.url()));
        let reply = client
            .delete_files(Some("polygons.gpkg".to_string()))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(reply.text, "The files were deleted successfully");
    }
}
