//! Server communication for simulation forms.
//!
//! - [`HttpSimulationApi`]: async HTTP client for the run, status, cancel,
//!   frame, compute, load and save endpoints
//! - [`poll_compute`] and [`poll_run_report`]: polling loops with
//!   cooperative stop through [`PollHandle`]
//! - [`FrameCache`]: on-disk frame responses keyed by simulation and model,
//!   with an expiry sweep

pub mod api;
pub mod error;
pub mod frame_cache;
pub mod http;
pub mod poll;
pub mod types;

pub use api::SimulationApi;
pub use error::{ClientError, Result};
pub use frame_cache::{DEFAULT_MAX_AGE_DAYS, FrameCache, fetch_frame};
pub use http::HttpSimulationApi;
pub use poll::{
    PollHandle, PollOutcome, PollRegistry, cancel_report, poll_compute, poll_run_report,
    stateful_compute,
};
pub use types::{
    ComputeRequest, ComputeResponse, RunRequest, RunStatus, SERVER_EXCEPTION,
    check_server_exception, decode,
};
