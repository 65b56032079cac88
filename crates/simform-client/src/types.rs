//! Request and response bodies exchanged with the simulation server.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use simform_model::ModelValues;

use crate::error::{ClientError, Result};

/// Response state marking a server-side exception.
pub const SERVER_EXCEPTION: &str = "srException";

/// Body of `/run-simulation` and `/run-cancel`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    pub models: BTreeMap<String, ModelValues>,
    pub force_run: bool,
    pub report: String,
    pub simulation_id: String,
    pub simulation_type: String,
}

impl RunRequest {
    pub fn new(
        simulation_type: impl Into<String>,
        simulation_id: impl Into<String>,
        report: impl Into<String>,
        models: BTreeMap<String, ModelValues>,
    ) -> Self {
        Self {
            models,
            force_run: false,
            report: report.into(),
            simulation_id: simulation_id.into(),
            simulation_type: simulation_type.into(),
        }
    }

    #[must_use]
    pub fn force_run(mut self, force: bool) -> Self {
        self.force_run = force;
        self
    }
}

/// A run or status response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatus {
    /// Absent on the first response, before the server assigns a state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Opaque token to send verbatim to `/run-status`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_request: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_request_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_count: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RunStatus {
    /// Whether polling continues: the state is absent, pending or running.
    pub fn is_pending(&self) -> bool {
        self.state
            .as_deref()
            .is_none_or(|state| matches!(state, "pending" | "running"))
    }
}

/// Body of `/stateful-compute`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeRequest {
    pub method: String,
    pub simulation_id: String,
    pub simulation_type: String,
    /// Method-specific arguments.
    #[serde(flatten)]
    pub args: Map<String, Value>,
}

impl ComputeRequest {
    pub fn new(
        simulation_type: impl Into<String>,
        simulation_id: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        Self {
            method: method.into(),
            simulation_id: simulation_id.into(),
            simulation_type: simulation_type.into(),
            args: Map::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, name: impl Into<String>, value: Value) -> Self {
        self.args.insert(name.into(), value);
        self
    }
}

/// A compute response. Only `state` is interpreted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ComputeResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ComputeResponse {
    /// Whether the compute is still pending or running.
    pub fn is_active(&self) -> bool {
        matches!(self.state.as_deref(), Some("pending" | "running"))
    }

    pub fn is_completed(&self) -> bool {
        self.state.as_deref() == Some("completed")
    }
}

/// Fail with [`ClientError::ServerException`] when a response body carries
/// `state: "srException"`.
///
/// The redirect target is read from `srException.routeName` and
/// `srException.params`.
pub fn check_server_exception(body: &Value) -> Result<()> {
    if body.get("state").and_then(Value::as_str) != Some(SERVER_EXCEPTION) {
        return Ok(());
    }
    let detail = body.get(SERVER_EXCEPTION);
    let route = detail
        .and_then(|d| d.get("routeName"))
        .and_then(Value::as_str)
        .unwrap_or("error")
        .to_string();
    let params = detail
        .and_then(|d| d.get("params"))
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    tracing::warn!("Server exception, redirect to {}", route);
    Err(ClientError::ServerException { route, params })
}

/// Check a raw body for a server exception, then decode it.
pub fn decode<T: serde::de::DeserializeOwned>(body: Value) -> Result<T> {
    check_server_exception(&body)?;
    Ok(serde_json::from_value(body)?)
}
