//! The application context: stores, server client, cache and poll sessions
//! constructed once at startup and passed by reference to consumers.

use std::collections::BTreeMap;

use serde_json::Value;
use simform_client::{
    ClientError, FrameCache, HttpSimulationApi, PollOutcome, PollRegistry, RunRequest, RunStatus,
    SimulationApi, fetch_frame, poll_run_report,
};
use simform_layout::{ResolvedView, resolve_view, view_dependencies};
use simform_model::{FormController, LoadOutcome, ModelError, ModelStore, SimulationSource};
use simform_schema::SchemaStore;

use crate::error::{AppError, Result};
use crate::settings::Settings;

/// Everything a simulation client needs, wired together.
///
/// `A` is the server client; [`HttpSimulationApi`] outside tests.
#[derive(Debug)]
pub struct AppContext<A = HttpSimulationApi> {
    settings: Settings,
    schema: SchemaStore,
    models: ModelStore,
    api: A,
    frame_cache: Option<FrameCache>,
    polls: PollRegistry,
}

impl AppContext<HttpSimulationApi> {
    /// Build a context talking HTTP to the server named in `settings`.
    pub fn connect(settings: Settings) -> Result<Self> {
        let api = HttpSimulationApi::new(
            settings.server.base_url.clone(),
            settings.server.request_timeout(),
        )?;
        Self::new(settings, api)
    }
}

impl<A> AppContext<A>
where
    A: SimulationApi + SimulationSource,
{
    /// Build a context around an existing server client.
    ///
    /// The frame cache directory is created when the cache is enabled.
    pub fn new(settings: Settings, api: A) -> Result<Self> {
        let frame_cache = if settings.frame_cache.enabled {
            Some(FrameCache::open(settings.frame_cache.resolved_directory())?)
        } else {
            None
        };
        Ok(Self {
            settings,
            schema: SchemaStore::new(),
            models: ModelStore::new(),
            api,
            frame_cache,
            polls: PollRegistry::new(),
        })
    }

    /// Install the schema and sweep expired cache entries.
    ///
    /// # Errors
    ///
    /// Fails if the schema is malformed or was already installed. A failed
    /// cache sweep, or an out-of-range cache age, is logged and does not
    /// stop startup.
    pub fn bootstrap(&self, simulation_type: &str, raw_schema: &str) -> Result<()> {
        self.schema.init_from_json(simulation_type, raw_schema)?;
        if let Some(cache) = &self.frame_cache {
            match self.settings.frame_cache.max_age() {
                Some(max_age) => {
                    if let Err(err) = cache.sweep_expired(max_age) {
                        tracing::warn!("Frame cache sweep failed: {}", err);
                    }
                }
                None => tracing::warn!(
                    "Skipping frame cache sweep: max_age_days {} is out of range",
                    self.settings.frame_cache.max_age_days
                ),
            }
        }
        tracing::info!("Bootstrapped {} client", simulation_type);
        Ok(())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn schema(&self) -> &SchemaStore {
        &self.schema
    }

    pub fn models(&self) -> &ModelStore {
        &self.models
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn frame_cache(&self) -> Option<&FrameCache> {
        self.frame_cache.as_ref()
    }

    pub fn polls(&self) -> &PollRegistry {
        &self.polls
    }

    /// Load a simulation into the model store.
    ///
    /// Models the schema declares but the server omitted are filled from
    /// the schema defaults and become part of the saved baseline.
    pub async fn open_simulation(&self, simulation_id: &str) -> Result<LoadOutcome> {
        let simulation_type = self.schema.simulation_type()?;
        let outcome = self
            .models
            .load_models(&self.api, simulation_type, simulation_id)
            .await?;
        if outcome == LoadOutcome::Applied {
            self.fill_missing_models()?;
        }
        Ok(outcome)
    }

    fn fill_missing_models(&self) -> Result<()> {
        let present = self.models.get_models()?;
        let missing: Vec<String> = self
            .schema
            .models()?
            .keys()
            .filter(|name| !present.contains_key(*name))
            .cloned()
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        for name in &missing {
            self.models.update_model(name, self.schema.default_model(name)?)?;
        }
        self.models.commit_models(&missing)?;
        tracing::debug!("Filled {} models from schema defaults", missing.len());
        Ok(())
    }

    /// A form session over the fields of a schema view.
    pub fn form(&self, view_name: &str) -> Result<FormController<'_>> {
        let dependencies = view_dependencies(&self.schema, view_name)?;
        Ok(FormController::new(&self.models, &self.schema, dependencies))
    }

    /// Resolve a schema view against the current models.
    pub fn view(&self, view_name: &str) -> Result<ResolvedView<'_>> {
        Ok(resolve_view(&self.schema, view_name, &self.models)?)
    }

    /// A run request for `report` carrying the current models.
    pub fn run_request(&self, report: &str) -> Result<RunRequest> {
        let info = self.models.simulation_info()?;
        let simulation_id = info
            .simulation_id()
            .ok_or_else(|| ModelError::MissingField {
                model: "simulation".to_string(),
                field: "simulationId".to_string(),
            })?
            .to_string();
        Ok(RunRequest::new(
            self.schema.simulation_type()?,
            simulation_id,
            report,
            info.models,
        ))
    }

    /// Run a report and poll it to completion.
    ///
    /// Starting a run supersedes any poll already running for the same
    /// report and drops the report's cached frames.
    pub async fn run_report<C>(&self, report: &str, callback: C) -> Result<PollOutcome<RunStatus>>
    where
        C: FnMut(&RunStatus),
    {
        let request = self.run_request(report)?.force_run(true);
        if let Some(cache) = &self.frame_cache {
            cache.invalidate(&request.simulation_id, report)?;
        }
        let handle = self.polls.start(&request.simulation_id, report);
        let result = poll_run_report(
            &self.api,
            &request,
            self.settings.polling.interval(),
            &handle,
            callback,
        )
        .await;
        self.polls.finish(&request.simulation_id, report, &handle);
        Ok(result?)
    }

    /// Ask the server to cancel a report's run.
    ///
    /// A poll loop for the report keeps running; use [`Self::stop_report`]
    /// to end it.
    pub async fn cancel_report(&self, report: &str) -> Result<()> {
        let request = self.run_request(report)?;
        Ok(simform_client::cancel_report(&self.api, &request).await?)
    }

    /// Stop polling a report. Returns whether a poll was active.
    pub fn stop_report(&self, report: &str) -> Result<bool> {
        let request = self.run_request(report)?;
        Ok(self.polls.stop(&request.simulation_id, report))
    }

    /// Fetch a frame of a report, through the frame cache when enabled.
    pub async fn frame(&self, report: &str, frame_id: &str) -> Result<Value> {
        let request = self.run_request(report)?;
        Ok(fetch_frame(
            &self.api,
            self.frame_cache.as_ref(),
            &request.simulation_id,
            report,
            frame_id,
        )
        .await?)
    }

    /// The page a server exception redirects to, formatted from the
    /// schema's routes. `None` for other errors.
    pub fn exception_route(&self, error: &AppError) -> Option<Result<String>> {
        let AppError::Client(ClientError::ServerException { route, params }) = error else {
            return None;
        };
        let params: BTreeMap<String, String> = params
            .iter()
            .map(|(key, value)| {
                let value = value.as_str().map_or_else(|| value.to_string(), str::to_string);
                (key.clone(), value)
            })
            .collect();
        Some(
            self.schema
                .format_route(route, &params)
                .map_err(AppError::from),
        )
    }
}
