//! The server operations used by the polling engine and frame cache.

use std::future::Future;

use serde_json::Value;

use crate::error::Result;
use crate::types::{ComputeRequest, ComputeResponse, RunRequest, RunStatus};

/// Simulation server endpoints.
///
/// [`HttpSimulationApi`](crate::HttpSimulationApi) talks to a real server;
/// tests substitute in-memory fakes.
pub trait SimulationApi {
    /// `POST /run-simulation`: start a run or attach to an existing one.
    fn run_simulation(&self, request: &RunRequest) -> impl Future<Output = Result<RunStatus>> + Send;

    /// `POST /run-status` with the server's `nextRequest` token, verbatim.
    fn run_status(&self, next_request: &Value) -> impl Future<Output = Result<RunStatus>> + Send;

    /// `POST /run-cancel`.
    fn run_cancel(&self, request: &RunRequest) -> impl Future<Output = Result<()>> + Send;

    /// `GET /simulation-frame/:frameId`.
    fn simulation_frame(&self, frame_id: &str) -> impl Future<Output = Result<Value>> + Send;

    /// `POST /stateful-compute`.
    fn stateful_compute(
        &self,
        request: &ComputeRequest,
    ) -> impl Future<Output = Result<ComputeResponse>> + Send;
}
