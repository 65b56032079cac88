//! Tests for loading and saving through a simulation source.

mod common;

use std::time::Duration;

use serde_json::json;
use simform_model::{LoadOutcome, ModelError, ModelEvent, ModelStore};

use common::{FakeSource, loaded_store};

#[tokio::test]
async fn load_replaces_state_and_notifies() {
    let store = ModelStore::new();
    let mut events = store.subscribe();
    let source = FakeSource::default();

    let outcome = store.load_models(&source, "demo", "abc").await.unwrap();

    assert_eq!(outcome, LoadOutcome::Applied);
    assert!(store.is_loaded());
    assert_eq!(store.get_model("m1").unwrap()["f1"], json!("abc"));
    assert_eq!(
        events.try_recv().unwrap(),
        ModelEvent::Loaded {
            simulation_id: Some("abc".to_string())
        }
    );
}

#[tokio::test]
async fn failed_load_keeps_previous_state() {
    let store = loaded_store();
    let source = FakeSource {
        fail_fetch: true,
        ..FakeSource::default()
    };

    let err = store.load_models(&source, "demo", "abc").await.unwrap_err();

    assert!(matches!(err, ModelError::Source { .. }));
    assert_eq!(store.get_model("m1").unwrap()["f1"], json!("a"));
}

#[tokio::test(start_paused = true)]
async fn slower_older_load_does_not_clobber_newer_one() {
    let store = ModelStore::new();
    let source = FakeSource {
        delays: vec![
            ("old".to_string(), Duration::from_millis(500)),
            ("new".to_string(), Duration::from_millis(10)),
        ],
        ..FakeSource::default()
    };

    let (old, new) = tokio::join!(
        store.load_models(&source, "demo", "old"),
        store.load_models(&source, "demo", "new"),
    );

    assert_eq!(old.unwrap(), LoadOutcome::Superseded);
    assert_eq!(new.unwrap(), LoadOutcome::Applied);
    assert_eq!(
        store.get_model("simulation").unwrap()["simulationId"],
        json!("new")
    );
}

#[tokio::test]
async fn save_snapshots_current_models_onto_envelope() {
    let store = loaded_store();
    let source = FakeSource::default();
    store
        .update_model("m1", common::values(json!({"f1": "edited"})))
        .unwrap();

    let mut envelope = store.simulation_info().unwrap();
    envelope.models.clear();
    envelope
        .extra
        .insert("version".to_string(), json!("20240101"));

    store.save_to_server(&source, &envelope).await.unwrap();

    let saved = source.last_saved().unwrap();
    assert_eq!(saved.models["m1"]["f1"], json!("edited"));
    assert_eq!(saved.extra["version"], json!("20240101"));
    assert_eq!(saved.simulation_id(), Some("123"));
}
