//! API Client
//!
//! HTTP client for talking to a running People Power server.

use pp_api::dto::HealthResponse;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use crate::error::{CliError, CliResult};

/// Response envelope as sent by the server
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub code: Option<String>,
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    fn into_result(self, status: u16) -> CliResult<T> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            _ => Err(CliError::api(
                status,
                self.error
                    .or(self.message)
                    .unwrap_or_else(|| "empty response".to_string()),
            )),
        }
    }
}

/// People Power API client
pub struct PpClient {
    client: Client,
    base_url: String,
}

impl PpClient {
    pub fn new(base_url: impl Into<String>) -> CliResult<Self> {
        Self::with_timeout(base_url, 30)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout_secs: u64) -> CliResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| CliError::connection(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get health status
    ///
    /// An unhealthy server answers 503 with a full health body; that body
    /// is still returned so the caller can show which component failed.
    pub async fn health(&self) -> CliResult<HealthResponse> {
        self.get("/api/v1/health").await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> CliResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CliError::connection(format!("{}: {}", url, e)))?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        match serde_json::from_str::<Envelope<T>>(&text) {
            Ok(envelope) => envelope.into_result(status),
            Err(_) => Err(CliError::api(status, text)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = PpClient::new("http://localhost:3000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000");
    }

    #[test]
    fn test_envelope_success() {
        let envelope: Envelope<i64> =
            serde_json::from_str(r#"{"success":true,"data":42}"#).unwrap();
        assert_eq!(envelope.into_result(200).unwrap(), 42);
    }

    #[test]
    fn test_envelope_error_keeps_message() {
        let envelope: Envelope<i64> = serde_json::from_str(
            r#"{"success":false,"error":"Insufficient power tokens","code":"INSUFFICIENT_FUNDS"}"#,
        )
        .unwrap();
        let err = envelope.into_result(400).unwrap_err();
        assert!(err.to_string().contains("Insufficient power tokens"));
        assert_eq!(err.exit_code(), 4);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_connection_error() {
        let client = PpClient::with_timeout("http://127.0.0.1:1", 1).unwrap();
        let err = client.health().await.unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
