//! Shared fixtures for model integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use serde_json::{Value, json};
use simform_model::{ModelStore, ModelValues, SimulationInfo, SimulationSource, SourceError};
use simform_schema::SchemaStore;

pub const SCHEMA: &str = r#"{
    "enum": {"Shape": [["circle", "Circle"], ["square", "Square"]]},
    "models": {
        "simulation": {
            "simulationId": ["Id", "OptionalString", ""],
            "name": ["Name", "String", "untitled"]
        },
        "m1": {
            "f1": ["Field 1", "String", ""],
            "f2": ["Field 2", "Float", 1.0, "", 0, 10]
        },
        "m2": {
            "shape": ["Shape", "Shape", "circle"],
            "count": ["Count", "Integer", 1, "", 1]
        }
    }
}"#;

pub fn schema() -> SchemaStore {
    let schema = SchemaStore::new();
    schema.init_from_json("demo", SCHEMA).expect("load schema");
    schema
}

pub fn simulation(id: &str, f1: &str) -> SimulationInfo {
    serde_json::from_value(json!({
        "simulationType": "demo",
        "models": {
            "simulation": {"simulationId": id, "name": "test"},
            "m1": {"f1": f1, "f2": 2.5},
            "m2": {"shape": "circle", "count": 3}
        }
    }))
    .expect("simulation fixture")
}

pub fn loaded_store() -> ModelStore {
    let store = ModelStore::new();
    store.apply_load(store.begin_load(), simulation("123", "a"));
    store
}

pub fn values(value: Value) -> ModelValues {
    value.as_object().cloned().expect("object")
}

/// In-memory simulation source.
///
/// Fetches answer after a per-id delay so tests can order responses.
#[derive(Default)]
pub struct FakeSource {
    pub delays: Vec<(String, Duration)>,
    pub fail_fetch: bool,
    pub fail_save: bool,
    pub saved: Mutex<VecDeque<SimulationInfo>>,
}

impl FakeSource {
    pub fn saved_count(&self) -> usize {
        self.saved.lock().unwrap().len()
    }

    pub fn last_saved(&self) -> Option<SimulationInfo> {
        self.saved.lock().unwrap().back().cloned()
    }
}

impl SimulationSource for FakeSource {
    async fn fetch_simulation(
        &self,
        _simulation_type: &str,
        simulation_id: &str,
    ) -> Result<SimulationInfo, SourceError> {
        let delay = self
            .delays
            .iter()
            .find(|(id, _)| id == simulation_id)
            .map(|(_, d)| *d)
            .unwrap_or_default();
        tokio::time::sleep(delay).await;
        if self.fail_fetch {
            return Err("connection refused".into());
        }
        Ok(simulation(simulation_id, simulation_id))
    }

    async fn save_simulation(&self, info: &SimulationInfo) -> Result<SimulationInfo, SourceError> {
        if self.fail_save {
            return Err("server unavailable".into());
        }
        self.saved.lock().unwrap().push_back(info.clone());
        Ok(info.clone())
    }
}
