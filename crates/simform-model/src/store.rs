//! The model store: single mutation authority for model values.
//!
//! The store keeps two copies of every model: the current in-memory values
//! that forms edit, and the saved baseline captured at load time and on each
//! commit. Dirty tracking compares the two; cancelling restores the baseline.
//!
//! Loads are tagged with a generation ticket. A response that arrives after
//! a newer load has started is discarded instead of clobbering newer state.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::broadcast;

use crate::error::{ModelError, Result};
use crate::source::{ModelValues, SimulationInfo, SimulationSource};

/// Capacity of the change-notification channel.
const EVENT_CAPACITY: usize = 64;

/// Change notifications broadcast to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelEvent {
    /// All models were replaced by a load; cached derived data is stale.
    Loaded { simulation_id: Option<String> },
    /// One model's values were replaced.
    Updated { model: String },
    /// Models were restored to their saved baseline.
    Reverted { models: Vec<String> },
    /// Models' current values became the new saved baseline.
    Committed { models: Vec<String> },
}

/// Identifies one `load_models` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket(u64);

/// Result of applying a load response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The response replaced the store's state.
    Applied,
    /// A newer load was started; the response was ignored.
    Superseded,
}

#[derive(Debug, Default)]
struct StoreState {
    is_loaded: bool,
    envelope: SimulationInfo,
    models: BTreeMap<String, ModelValues>,
    saved: BTreeMap<String, ModelValues>,
}

/// Keyed mapping from model name to current field values.
#[derive(Debug)]
pub struct ModelStore {
    state: RwLock<StoreState>,
    generation: AtomicU64,
    events: broadcast::Sender<ModelEvent>,
}

impl Default for ModelStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelStore {
    /// Create an empty, unloaded store.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: RwLock::new(StoreState::default()),
            generation: AtomicU64::new(0),
            events,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, event: ModelEvent) {
        // No receivers is not an error.
        let _ = self.events.send(event);
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<ModelEvent> {
        self.events.subscribe()
    }

    /// Whether a simulation has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.read().is_loaded
    }

    /// Fetch a simulation and replace the store's state with it.
    ///
    /// If another load starts before this one's response arrives, the
    /// response (or failure) is discarded and [`LoadOutcome::Superseded`]
    /// is returned. Otherwise a failure leaves the previous state untouched
    /// and is returned to the caller.
    pub async fn load_models<S: SimulationSource>(
        &self,
        source: &S,
        simulation_type: &str,
        simulation_id: &str,
    ) -> Result<LoadOutcome> {
        let ticket = self.begin_load();
        tracing::debug!(
            "Loading simulation {}/{} (generation {})",
            simulation_type,
            simulation_id,
            ticket.0
        );
        match source.fetch_simulation(simulation_type, simulation_id).await {
            Ok(info) => Ok(self.apply_load(ticket, info)),
            Err(_) if !self.is_current(ticket) => {
                tracing::warn!(
                    "Ignoring failed load of {} superseded by a newer request",
                    simulation_id
                );
                Ok(LoadOutcome::Superseded)
            }
            Err(err) => Err(ModelError::Source { source: err }),
        }
    }

    /// Start a load and return its ticket, superseding earlier loads.
    pub fn begin_load(&self) -> LoadTicket {
        LoadTicket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether `ticket` belongs to the most recent load.
    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.0
    }

    /// Apply a fetched simulation if `ticket` is still current.
    pub fn apply_load(&self, ticket: LoadTicket, mut info: SimulationInfo) -> LoadOutcome {
        let mut state = self.write();
        // Checked under the write lock so a concurrent apply cannot interleave.
        if !self.is_current(ticket) {
            tracing::warn!("Discarding stale model load (generation {})", ticket.0);
            return LoadOutcome::Superseded;
        }
        let models = std::mem::take(&mut info.models);
        let simulation_id = info_id(&models);
        tracing::info!(
            "Loaded {} models for simulation {}",
            models.len(),
            simulation_id.as_deref().unwrap_or("<unknown>")
        );
        *state = StoreState {
            is_loaded: true,
            envelope: info,
            saved: models.clone(),
            models,
        };
        drop(state);
        self.notify(ModelEvent::Loaded { simulation_id });
        LoadOutcome::Applied
    }

    /// Current values of one model.
    pub fn get_model(&self, name: &str) -> Result<ModelValues> {
        let state = self.read();
        if !state.is_loaded {
            return Err(ModelError::NotLoaded);
        }
        state
            .models
            .get(name)
            .cloned()
            .ok_or_else(|| ModelError::UnknownModel(name.to_string()))
    }

    /// Current values of every model.
    pub fn get_models(&self) -> Result<BTreeMap<String, ModelValues>> {
        let state = self.read();
        if !state.is_loaded {
            return Err(ModelError::NotLoaded);
        }
        Ok(state.models.clone())
    }

    /// Saved baseline of one model, if it has one.
    pub fn saved_model(&self, name: &str) -> Result<Option<ModelValues>> {
        let state = self.read();
        if !state.is_loaded {
            return Err(ModelError::NotLoaded);
        }
        Ok(state.saved.get(name).cloned())
    }

    /// Replace one model's values wholesale.
    pub fn update_model(&self, name: &str, values: ModelValues) -> Result<()> {
        {
            let mut state = self.write();
            if !state.is_loaded {
                return Err(ModelError::NotLoaded);
            }
            state.models.insert(name.to_string(), values);
        }
        tracing::debug!("Updated model {}", name);
        self.notify(ModelEvent::Updated {
            model: name.to_string(),
        });
        Ok(())
    }

    /// Make the current values of `names` the new saved baseline.
    pub fn commit_models(&self, names: &[String]) -> Result<()> {
        {
            let mut state = self.write();
            if !state.is_loaded {
                return Err(ModelError::NotLoaded);
            }
            for name in names {
                match state.models.get(name).cloned() {
                    Some(values) => {
                        state.saved.insert(name.clone(), values);
                    }
                    None => {
                        state.saved.remove(name);
                    }
                }
            }
        }
        self.notify(ModelEvent::Committed {
            models: names.to_vec(),
        });
        Ok(())
    }

    /// Restore `names` to their saved baseline, discarding edits.
    pub fn revert_models(&self, names: &[String]) -> Result<()> {
        {
            let mut state = self.write();
            if !state.is_loaded {
                return Err(ModelError::NotLoaded);
            }
            for name in names {
                match state.saved.get(name).cloned() {
                    Some(values) => {
                        state.models.insert(name.clone(), values);
                    }
                    None => {
                        state.models.remove(name);
                    }
                }
            }
        }
        tracing::debug!("Reverted models {:?}", names);
        self.notify(ModelEvent::Reverted {
            models: names.to_vec(),
        });
        Ok(())
    }

    /// The loaded simulation envelope carrying the current models.
    pub fn simulation_info(&self) -> Result<SimulationInfo> {
        let state = self.read();
        if !state.is_loaded {
            return Err(ModelError::NotLoaded);
        }
        let mut info = state.envelope.clone();
        info.models = state.models.clone();
        Ok(info)
    }

    /// Write the current models to the server on top of `info`.
    ///
    /// The request is made once; retrying or applying the response is up to
    /// the caller.
    pub async fn save_to_server<S: SimulationSource>(
        &self,
        source: &S,
        info: &SimulationInfo,
    ) -> Result<SimulationInfo> {
        let mut snapshot = info.clone();
        snapshot.models = self.get_models()?;
        tracing::info!(
            "Saving simulation {}",
            snapshot.simulation_id().unwrap_or("<unknown>")
        );
        source
            .save_simulation(&snapshot)
            .await
            .map_err(|source| ModelError::Source { source })
    }
}

fn info_id(models: &BTreeMap<String, ModelValues>) -> Option<String> {
    models
        .get("simulation")?
        .get("simulationId")?
        .as_str()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn info() -> SimulationInfo {
        serde_json::from_value(json!({
            "simulationType": "demo",
            "models": {
                "simulation": {"simulationId": "123"},
                "m1": {"f1": "a"}
            }
        }))
        .unwrap()
    }

    fn values(v: serde_json::Value) -> ModelValues {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_reads_fail_before_load() {
        let store = ModelStore::new();
        assert!(!store.is_loaded());
        assert!(matches!(store.get_model("m1"), Err(ModelError::NotLoaded)));
        assert!(matches!(store.get_models(), Err(ModelError::NotLoaded)));
    }

    #[test]
    fn test_apply_load() {
        let store = ModelStore::new();
        let ticket = store.begin_load();
        assert_eq!(store.apply_load(ticket, info()), LoadOutcome::Applied);
        assert!(store.is_loaded());
        assert_eq!(store.get_model("m1").unwrap()["f1"], json!("a"));
        assert!(matches!(
            store.get_model("m2"),
            Err(ModelError::UnknownModel(_))
        ));
    }

    #[test]
    fn test_stale_load_is_discarded() {
        let store = ModelStore::new();
        let first = store.begin_load();
        let second = store.begin_load();

        let mut newer = info();
        newer.models.insert("m1".to_string(), values(json!({"f1": "new"})));
        assert_eq!(store.apply_load(second, newer), LoadOutcome::Applied);
        assert_eq!(store.apply_load(first, info()), LoadOutcome::Superseded);
        assert_eq!(store.get_model("m1").unwrap()["f1"], json!("new"));
    }

    #[test]
    fn test_update_replaces_wholesale() {
        let store = ModelStore::new();
        store.apply_load(store.begin_load(), info());
        store
            .update_model("m1", values(json!({"f2": "b"})))
            .unwrap();
        let m1 = store.get_model("m1").unwrap();
        assert!(m1.get("f1").is_none());
        assert_eq!(m1["f2"], json!("b"));
    }

    #[test]
    fn test_commit_and_revert() {
        let store = ModelStore::new();
        store.apply_load(store.begin_load(), info());
        let names = vec!["m1".to_string()];

        store.update_model("m1", values(json!({"f1": "x"}))).unwrap();
        store.revert_models(&names).unwrap();
        assert_eq!(store.get_model("m1").unwrap()["f1"], json!("a"));

        store.update_model("m1", values(json!({"f1": "x"}))).unwrap();
        store.commit_models(&names).unwrap();
        assert_eq!(store.saved_model("m1").unwrap().unwrap()["f1"], json!("x"));
    }

    #[test]
    fn test_events() {
        let store = ModelStore::new();
        let mut rx = store.subscribe();
        store.apply_load(store.begin_load(), info());
        store.update_model("m1", values(json!({"f1": "y"}))).unwrap();

        assert_eq!(
            rx.try_recv().unwrap(),
            ModelEvent::Loaded {
                simulation_id: Some("123".to_string())
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            ModelEvent::Updated {
                model: "m1".to_string()
            }
        );
    }

    #[test]
    fn test_simulation_info_carries_current_models() {
        let store = ModelStore::new();
        store.apply_load(store.begin_load(), info());
        store.update_model("m1", values(json!({"f1": "z"}))).unwrap();
        let info = store.simulation_info().unwrap();
        assert_eq!(info.simulation_type, "demo");
        assert_eq!(info.models["m1"]["f1"], json!("z"));
    }
}
