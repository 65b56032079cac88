//! Polling of long-running computations and simulation runs.
//!
//! Both loops invoke their callback on every response and stop once the
//! state is terminal. Network and parse failures propagate; nothing retries.
//! Run polling is cooperative: a [`PollHandle`] is checked before every
//! callback and every re-fetch, so a stopped session never applies a late
//! response.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde_json::Value;

use crate::api::SimulationApi;
use crate::error::{ClientError, Result};
use crate::types::{ComputeRequest, ComputeResponse, RunRequest, RunStatus, decode};

/// Stop flag for one polling session.
///
/// Clones share the flag. The generation distinguishes sessions started for
/// the same report.
#[derive(Debug, Clone, Default)]
pub struct PollHandle {
    generation: u64,
    stopped: Arc<AtomicBool>,
}

impl PollHandle {
    pub fn new(generation: u64) -> Self {
        Self {
            generation,
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Ask the session to stop. In-flight requests are not aborted, but
    /// their responses are discarded.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// How a polling loop ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome<T> {
    /// A terminal response was received.
    Finished(T),
    /// The session was stopped before reaching a terminal state.
    Stopped,
}

impl<T> PollOutcome<T> {
    pub fn finished(self) -> Option<T> {
        match self {
            Self::Finished(value) => Some(value),
            Self::Stopped => None,
        }
    }
}

/// Active run-polling sessions keyed by simulation id and report name.
///
/// Starting a session for a key stops the session it replaces.
#[derive(Debug, Default)]
pub struct PollRegistry {
    next_generation: AtomicU64,
    sessions: Mutex<HashMap<(String, String), PollHandle>>,
}

impl PollRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session, superseding any earlier one for the same report.
    pub fn start(&self, simulation_id: &str, report: &str) -> PollHandle {
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let handle = PollHandle::new(generation);
        let key = (simulation_id.to_string(), report.to_string());
        let previous = self
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, handle.clone());
        if let Some(previous) = previous {
            tracing::debug!(
                "Superseding poll of {}/{} (generation {})",
                simulation_id,
                report,
                previous.generation()
            );
            previous.stop();
        }
        handle
    }

    /// Stop the session for a report. Returns whether one was active.
    pub fn stop(&self, simulation_id: &str, report: &str) -> bool {
        let removed = self
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(simulation_id.to_string(), report.to_string()));
        removed.inspect(PollHandle::stop).is_some()
    }

    /// Stop every session.
    pub fn stop_all(&self) {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        for handle in sessions.values() {
            handle.stop();
        }
        sessions.clear();
    }

    /// Forget a finished session, unless it has already been replaced.
    pub fn finish(&self, simulation_id: &str, report: &str, handle: &PollHandle) {
        let key = (simulation_id.to_string(), report.to_string());
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        if sessions
            .get(&key)
            .is_some_and(|current| current.generation() == handle.generation())
        {
            sessions.remove(&key);
        }
    }

    pub fn is_active(&self, simulation_id: &str, report: &str) -> bool {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&(simulation_id.to_string(), report.to_string()))
    }
}

/// Poll a computation until it leaves the `pending`/`running` states.
///
/// `do_fetch` yields a raw JSON body. The callback sees every response,
/// intermediate ones included. Returns the terminal response.
pub async fn poll_compute<F, Fut, C>(
    mut do_fetch: F,
    poll_interval: Duration,
    mut callback: C,
) -> Result<ComputeResponse>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Value>>,
    C: FnMut(&ComputeResponse),
{
    loop {
        let response: ComputeResponse = decode(do_fetch().await?)?;
        callback(&response);
        if !response.is_active() {
            return Ok(response);
        }
        tracing::debug!(
            "Compute is {:?}, polling again in {:?}",
            response.state,
            poll_interval
        );
        tokio::time::sleep(poll_interval).await;
    }
}

/// Start or attach to a run and poll its status until it is terminal.
///
/// The first request is `/run-simulation`; every later one sends the
/// server's `nextRequest` token to `/run-status`. Polling continues while
/// the state is absent, `pending` or `running`, waiting `nextRequestSeconds`
/// when the server supplies it and `poll_interval` otherwise.
///
/// # Errors
///
/// Request failures propagate unchanged. A pending response without a
/// `nextRequest` fails with [`ClientError::MissingContinuation`]. Failures
/// that arrive after the handle is stopped are discarded.
pub async fn poll_run_report<A, C>(
    api: &A,
    request: &RunRequest,
    poll_interval: Duration,
    handle: &PollHandle,
    mut callback: C,
) -> Result<PollOutcome<RunStatus>>
where
    A: SimulationApi,
    C: FnMut(&RunStatus),
{
    if handle.is_stopped() {
        return Ok(PollOutcome::Stopped);
    }
    tracing::info!(
        "Running {} for simulation {}",
        request.report,
        request.simulation_id
    );
    let mut result = api.run_simulation(request).await;
    loop {
        if handle.is_stopped() {
            tracing::debug!(
                "Discarding response for stopped poll of {} (generation {})",
                request.report,
                handle.generation()
            );
            return Ok(PollOutcome::Stopped);
        }
        let status = result?;
        callback(&status);
        if !status.is_pending() {
            tracing::debug!("Run of {} ended in {:?}", request.report, status.state);
            return Ok(PollOutcome::Finished(status));
        }

        let Some(next_request) = status.next_request else {
            return Err(ClientError::MissingContinuation {
                state: status.state.unwrap_or_else(|| "<none>".to_string()),
            });
        };
        let delay = status
            .next_request_seconds
            .and_then(|seconds| Duration::try_from_secs_f64(seconds).ok())
            .unwrap_or(poll_interval);
        tokio::time::sleep(delay).await;
        if handle.is_stopped() {
            return Ok(PollOutcome::Stopped);
        }
        result = api.run_status(&next_request).await;
    }
}

/// Ask the server to cancel a run.
///
/// This does not stop a client-side poll loop for the same report; stop its
/// [`PollHandle`] separately.
pub async fn cancel_report<A: SimulationApi>(api: &A, request: &RunRequest) -> Result<()> {
    let request = request.clone().force_run(false);
    tracing::info!(
        "Cancelling {} for simulation {}",
        request.report,
        request.simulation_id
    );
    api.run_cancel(&request).await
}

/// Issue a stateful compute request. The callback fires only when the
/// response state is `completed`.
pub async fn stateful_compute<A, C>(
    api: &A,
    request: &ComputeRequest,
    callback: C,
) -> Result<ComputeResponse>
where
    A: SimulationApi,
    C: FnOnce(&ComputeResponse),
{
    let response = api.stateful_compute(request).await?;
    if response.is_completed() {
        callback(&response);
    } else {
        tracing::debug!(
            "Stateful compute {} returned {:?}",
            request.method,
            response.state
        );
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_supersedes_same_report() {
        let registry = PollRegistry::new();
        let first = registry.start("abc", "intensityReport");
        let other = registry.start("abc", "powerReport");
        let second = registry.start("abc", "intensityReport");

        assert!(first.is_stopped());
        assert!(!second.is_stopped());
        assert!(!other.is_stopped());
        assert!(second.generation() > first.generation());
    }

    #[test]
    fn test_finish_ignores_replaced_handle() {
        let registry = PollRegistry::new();
        let first = registry.start("abc", "r");
        let second = registry.start("abc", "r");

        registry.finish("abc", "r", &first);
        assert!(registry.is_active("abc", "r"));

        registry.finish("abc", "r", &second);
        assert!(!registry.is_active("abc", "r"));
    }

    #[test]
    fn test_stop_and_stop_all() {
        let registry = PollRegistry::new();
        let a = registry.start("abc", "a");
        let b = registry.start("abc", "b");

        assert!(registry.stop("abc", "a"));
        assert!(!registry.stop("abc", "a"));
        assert!(a.is_stopped());

        registry.stop_all();
        assert!(b.is_stopped());
        assert!(!registry.is_active("abc", "b"));
    }

    #[test]
    fn test_clones_share_the_flag() {
        let handle = PollHandle::new(7);
        let clone = handle.clone();
        clone.stop();
        assert!(handle.is_stopped());
        assert_eq!(PollOutcome::Finished(1).finished(), Some(1));
        assert_eq!(PollOutcome::<i32>::Stopped.finished(), None);
    }
}
