//! Simulation envelope and the server seam used to load and save it.

use std::collections::BTreeMap;
use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field values of one model, keyed by field name.
pub type ModelValues = Map<String, Value>;

/// Boxed error returned by a [`SimulationSource`].
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// The simulation document exchanged with the server.
///
/// Fields this layer does not interpret are kept in `extra` and written back
/// unchanged on save.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationInfo {
    #[serde(default)]
    pub simulation_type: String,
    #[serde(default)]
    pub models: BTreeMap<String, ModelValues>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SimulationInfo {
    /// Create an envelope for a simulation type with the given models.
    pub fn new(simulation_type: impl Into<String>, models: BTreeMap<String, ModelValues>) -> Self {
        Self {
            simulation_type: simulation_type.into(),
            models,
            extra: Map::new(),
        }
    }

    /// The simulation id, stored on the `simulation` model.
    pub fn simulation_id(&self) -> Option<&str> {
        self.models
            .get("simulation")?
            .get("simulationId")?
            .as_str()
    }
}

/// Server operations the model store depends on.
pub trait SimulationSource {
    /// Fetch the full simulation document.
    fn fetch_simulation(
        &self,
        simulation_type: &str,
        simulation_id: &str,
    ) -> impl Future<Output = Result<SimulationInfo, SourceError>> + Send;

    /// Persist a simulation document, returning the server's copy.
    fn save_simulation(
        &self,
        info: &SimulationInfo,
    ) -> impl Future<Output = Result<SimulationInfo, SourceError>> + Send;
}
