//! HTTP implementation of the simulation server endpoints.

use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use simform_model::{SimulationInfo, SimulationSource, SourceError};

use crate::api::SimulationApi;
use crate::error::{ClientError, Result};
use crate::types::{ComputeRequest, ComputeResponse, RunRequest, RunStatus, decode};

/// User agent string for API requests.
const USER_AGENT_VALUE: &str = concat!("simform/", env!("CARGO_PKG_VERSION"));

/// Async client for a simulation server.
#[derive(Debug, Clone)]
pub struct HttpSimulationApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSimulationApi {
    /// Creates a client for the server at `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        tracing::debug!("GET {}", url);
        let response = self.client.get(&url).send().await?;
        decode(Self::handle_response(response).await?)
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.url(path);
        tracing::debug!("POST {}", url);
        let response = self.client.post(&url).json(body).send().await?;
        decode(Self::handle_response(response).await?)
    }

    /// Checks the status and reads the body as JSON.
    async fn handle_response(response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }
}

impl SimulationApi for HttpSimulationApi {
    async fn run_simulation(&self, request: &RunRequest) -> Result<RunStatus> {
        self.post("/run-simulation", request).await
    }

    async fn run_status(&self, next_request: &Value) -> Result<RunStatus> {
        self.post("/run-status", next_request).await
    }

    async fn run_cancel(&self, request: &RunRequest) -> Result<()> {
        let _ack: Value = self.post("/run-cancel", request).await?;
        Ok(())
    }

    async fn simulation_frame(&self, frame_id: &str) -> Result<Value> {
        self.get(&format!("/simulation-frame/{frame_id}")).await
    }

    async fn stateful_compute(&self, request: &ComputeRequest) -> Result<ComputeResponse> {
        self.post("/stateful-compute", request).await
    }
}

impl SimulationSource for HttpSimulationApi {
    async fn fetch_simulation(
        &self,
        simulation_type: &str,
        simulation_id: &str,
    ) -> std::result::Result<SimulationInfo, SourceError> {
        let info = self
            .get(&format!("/simulation/{simulation_type}/{simulation_id}/0"))
            .await?;
        Ok(info)
    }

    async fn save_simulation(
        &self,
        info: &SimulationInfo,
    ) -> std::result::Result<SimulationInfo, SourceError> {
        let saved = self.post("/save-simulation", info).await?;
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let api = HttpSimulationApi::new("http://localhost:8000/", Duration::from_secs(5)).unwrap();
        assert_eq!(api.base_url(), "http://localhost:8000");
        assert_eq!(
            api.url("/run-status"),
            "http://localhost:8000/run-status"
        );
    }
}
