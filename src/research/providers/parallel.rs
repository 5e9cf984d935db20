//! Parallel Task API client using `reqwest`.
//!
//! Endpoints:
//! - `POST /v1/tasks/runs` creates a run from `{input, processor}`
//! - `GET /v1/tasks/runs/{run_id}` reports status
//! - `GET /v1/tasks/runs/{run_id}/result` returns output and basis
//!
//! Requests authenticate with the `x-api-key` header.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER};
use reqwest::{Client, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::core::ProcessorTier;
use crate::error::RemoteError;
use crate::research::provider::ResearchApi;
use crate::research::run::{RunHandle, RunStatus, TaskRunResult};

const USER_AGENT: &str = concat!("parallel-mcp/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct CreateRunRequest<'a> {
    input: &'a str,
    processor: &'a str,
}

/// HTTP client for the Parallel Task API.
pub struct ParallelClient {
    http: Client,
    base_url: String,
}

impl ParallelClient {
    /// Creates a client for `base_url` authenticated with `api_key`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] if the key is not a valid header value or
    /// the HTTP client cannot be built.
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let mut key = HeaderValue::from_str(api_key).map_err(|e| RemoteError::Unavailable {
            message: format!("invalid API key: {e}"),
        })?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", key);

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Turns a non-success response into [`RemoteError::Http`].
    async fn error_from_response(response: Response) -> RemoteError {
        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok());
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "failed to read response body".to_string());

        RemoteError::Http {
            status,
            message,
            retry_after,
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| RemoteError::Decode {
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl ResearchApi for ParallelClient {
    fn name(&self) -> &'static str {
        "parallel"
    }

    async fn create_run(
        &self,
        query: &str,
        processor: ProcessorTier,
    ) -> Result<RunHandle, RemoteError> {
        let body = CreateRunRequest {
            input: query,
            processor: processor.as_str(),
        };
        let response = self
            .http
            .post(self.url("/v1/tasks/runs"))
            .json(&body)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn get_status(&self, run_id: &str) -> Result<RunStatus, RemoteError> {
        let response = self
            .http
            .get(self.url(&format!("/v1/tasks/runs/{run_id}")))
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn get_result(&self, run_id: &str) -> Result<TaskRunResult, RemoteError> {
        let response = self
            .http
            .get(self.url(&format!("/v1/tasks/runs/{run_id}/result")))
            .send()
            .await?;
        Self::decode(response).await
    }
}

impl std::fmt::Debug for ParallelClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParallelClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
