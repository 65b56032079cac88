//! Tests for resolving dependency groups.

mod common;

use std::cell::RefCell;
use std::collections::BTreeMap;

use serde_json::json;
use simform_model::{
    Dependency, FieldError, ModelAccess, ModelError, ModelValues, Result, resolve_group,
};

use common::{loaded_store, schema, values};

/// Model access that records every read.
struct CountingAccess {
    models: RefCell<BTreeMap<String, ModelValues>>,
    reads: RefCell<Vec<String>>,
}

impl CountingAccess {
    fn new() -> Self {
        let mut models = BTreeMap::new();
        models.insert("m1".to_string(), values(json!({"f1": "a", "f2": 3})));
        models.insert("m2".to_string(), values(json!({"shape": "square"})));
        Self {
            models: RefCell::new(models),
            reads: RefCell::new(Vec::new()),
        }
    }
}

impl ModelAccess for CountingAccess {
    fn read_model(&self, name: &str) -> Result<ModelValues> {
        self.reads.borrow_mut().push(name.to_string());
        self.models
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| ModelError::UnknownModel(name.to_string()))
    }

    fn write_model(&self, name: &str, values: ModelValues) -> Result<()> {
        self.models.borrow_mut().insert(name.to_string(), values);
        Ok(())
    }
}

fn deps(inputs: &[&str]) -> Vec<Dependency> {
    Dependency::parse_all(inputs).unwrap()
}

#[test]
fn each_model_is_read_once() {
    let schema = schema();
    let access = CountingAccess::new();
    let group = resolve_group(&deps(&["m1.f1", "m1.f2", "m2.shape"]), &access, &schema).unwrap();

    assert_eq!(group.len(), 3);
    assert_eq!(*access.reads.borrow(), vec!["m1".to_string(), "m2".to_string()]);
}

#[test]
fn resolved_values_and_metadata() {
    let schema = schema();
    let access = CountingAccess::new();
    let group = resolve_group(&deps(&["m1.f2", "m2.count"]), &access, &schema).unwrap();

    let f2 = group.get(&Dependency::new("m1", "f2")).unwrap();
    assert_eq!(f2.value, json!(3));
    assert_eq!(f2.display_name(), "Field 2");
    assert_eq!(f2.model.name(), "m1");
    assert!(f2.is_valid());

    // Absent values fall back to the schema default.
    let count = group.get(&Dependency::new("m2", "count")).unwrap();
    assert_eq!(count.value, json!(1));
}

#[test]
fn lookup_is_structural() {
    let schema = schema();
    let access = CountingAccess::new();
    let group = resolve_group(&deps(&["m1.f1"]), &access, &schema).unwrap();

    let fresh = Dependency::parse("m1.f1").unwrap();
    assert!(group.get(&fresh).is_some());
    assert!(group.get(&Dependency::new("m1", "f2")).is_none());
}

#[test]
fn missing_field_is_a_configuration_error() {
    let schema = schema();
    let access = CountingAccess::new();
    let err = resolve_group(&deps(&["m1.unknownField"]), &access, &schema).unwrap_err();
    match &err {
        ModelError::MissingField { model, field } => {
            assert_eq!(model, "m1");
            assert_eq!(field, "unknownField");
        }
        other => panic!("unexpected error: {other}"),
    }
    let message = err.to_string();
    assert!(message.contains("m1") && message.contains("unknownField"));
}

#[test]
fn missing_model_is_a_configuration_error() {
    let schema = schema();
    let access = CountingAccess::new();
    let err = resolve_group(&deps(&["beam.energy"]), &access, &schema).unwrap_err();
    assert!(matches!(err, ModelError::MissingField { ref model, .. } if model == "beam"));
    assert!(access.reads.borrow().is_empty());
}

#[test]
fn wildcard_expands_to_schema_fields() {
    let schema = schema();
    let access = CountingAccess::new();
    let group = resolve_group(&deps(&["m1.*", "m1.f1"]), &access, &schema).unwrap();

    assert_eq!(group.len(), 2);
    assert!(group.get(&Dependency::new("m1", "f1")).is_some());
    assert!(group.get(&Dependency::new("m1", "f2")).is_some());
    assert_eq!(access.reads.borrow().len(), 1);
}

#[test]
fn validation_errors_are_reported_per_field() {
    let schema = schema();
    let access = CountingAccess::new();
    access
        .write_model("m1", values(json!({"f1": "", "f2": 42})))
        .unwrap();
    let group = resolve_group(&deps(&["m1.f1", "m1.f2", "m2.shape"]), &access, &schema).unwrap();

    assert!(!group.is_valid());
    let invalid = group.invalid_fields();
    assert_eq!(invalid.len(), 2);
    assert_eq!(invalid[0].error, FieldError::Required);
    assert_eq!(invalid[1].error, FieldError::AboveMaximum { max: 10.0 });
}

#[test]
fn writes_go_through_the_model_handle() {
    let schema = schema();
    let store = loaded_store();
    let group = resolve_group(&deps(&["m1.f1"]), &store, &schema).unwrap();

    group
        .get(&Dependency::new("m1", "f1"))
        .unwrap()
        .set_value(json!("edited"))
        .unwrap();
    let m1 = store.get_model("m1").unwrap();
    assert_eq!(m1["f1"], json!("edited"));
    assert_eq!(m1["f2"], json!(2.5));
}
