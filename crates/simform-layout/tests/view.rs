//! Integration tests for resolving and rendering schema views.

use serde_json::json;
use simform_layout::{LayoutError, LayoutKind, RenderNode, resolve_view, view_dependencies};
use simform_model::{Dependency, ModelError, ModelStore, SimulationInfo};
use simform_schema::SchemaStore;

const SCHEMA: &str = r#"{
    "models": {
        "beam": {
            "energy": ["Energy [GeV]", "Float", 3.0, "", 0, 10],
            "current": ["Current [A]", "Float", 0.5],
            "sizeX": ["Size X", "Float", 1.0],
            "sizeY": ["Size Y", "Float", 1.0]
        },
        "grid": {
            "shape": ["Shape", "GridShape", "square"],
            "count": ["Count", "Integer", 10, "", 1]
        }
    },
    "enum": {
        "GridShape": [["square", "Square"], ["circle", "Circle"]]
    },
    "view": {
        "beam": {
            "title": "Beam",
            "basic": ["energy"],
            "advanced": ["energy", "current"]
        },
        "size": {
            "layout": "grid",
            "config": {
                "columns": ["Horizontal", "Vertical"],
                "rows": [{"label": "Size", "fields": ["beam.sizeX", "beam.sizeY"]}]
            }
        },
        "everything": {
            "layout": "tabs",
            "config": {"tabs": [
                {"name": "Beam", "items": [{"layout": "list", "config": {"fields": ["beam.*"]}}]},
                {"name": "Grid", "items": [{"layout": "list", "config": {"fields": ["grid.shape", "grid.count"]}}]}
            ]}
        },
        "broken": {"layout": "list", "config": {"fields": ["beam.missing"]}},
        "odd": {"layout": "carousel"}
    }
}"#;

fn setup() -> (SchemaStore, ModelStore) {
    let schema = SchemaStore::new();
    schema.init_from_json("demo", SCHEMA).unwrap();
    let store = ModelStore::new();
    let info: SimulationInfo = serde_json::from_value(json!({
        "simulationType": "demo",
        "models": {
            "simulation": {"simulationId": "s1"},
            "beam": {"energy": 6.0, "current": 0.2, "sizeX": 1.5, "sizeY": 2.5},
            "grid": {"shape": "hexagon", "count": 4}
        }
    }))
    .unwrap();
    store.apply_load(store.begin_load(), info);
    (schema, store)
}

#[test]
fn legacy_view_resolves_each_field_once() {
    let (schema, store) = setup();
    let view = resolve_view(&schema, "beam", &store).unwrap();

    assert_eq!(view.layout.kind(), LayoutKind::Panel);
    assert_eq!(view.group.len(), 2);
    assert!(view.is_valid());

    let energy = view.group.get(&Dependency::new("beam", "energy")).unwrap();
    assert_eq!(energy.display_name(), "Energy [GeV]");
    assert_eq!(energy.value, json!(6.0));
}

#[test]
fn grid_renders_rows_of_cells() {
    let (schema, store) = setup();
    let view = resolve_view(&schema, "size", &store).unwrap();

    let RenderNode::Grid { columns, rows } = view.render().unwrap() else {
        panic!("expected a grid");
    };
    assert_eq!(columns, vec!["Horizontal", "Vertical"]);
    assert_eq!(rows.len(), 1);
    let labels: Vec<_> = rows[0]
        .cells
        .iter()
        .map(|cell| cell.as_ref().unwrap().label.clone())
        .collect();
    assert_eq!(labels, vec!["Size X", "Size Y"]);
}

#[test]
fn tabs_expand_wildcards_and_carry_validity() {
    let (schema, store) = setup();
    let view = resolve_view(&schema, "everything", &store).unwrap();
    let tree = view.render().unwrap();

    let fields = tree.fields();
    assert_eq!(fields.len(), 6);
    let shape = fields
        .iter()
        .find(|f| f.dependency == Dependency::new("grid", "shape"))
        .unwrap();
    assert!(!shape.valid);
    assert!(shape.error.is_some());
    assert!(!view.is_valid());
}

#[test]
fn render_tree_serializes_with_layout_tags() {
    let (schema, store) = setup();
    let tree = resolve_view(&schema, "size", &store)
        .unwrap()
        .render()
        .unwrap();
    let json = serde_json::to_value(&tree).unwrap();
    assert_eq!(json["layout"], json!("grid"));
    assert_eq!(json["rows"][0]["cells"][1]["dependency"], json!("beam.sizeY"));
}

#[test]
fn view_dependencies_are_parsed_in_order() {
    let (schema, _) = setup();
    let deps = view_dependencies(&schema, "everything").unwrap();
    assert_eq!(
        deps,
        vec![
            Dependency::all_fields("beam"),
            Dependency::new("grid", "shape"),
            Dependency::new("grid", "count"),
        ]
    );
}

#[test]
fn missing_field_names_model_and_field() {
    let (schema, store) = setup();
    let err = resolve_view(&schema, "broken", &store).unwrap_err();
    assert!(matches!(
        err,
        LayoutError::Model(ModelError::MissingField { ref model, ref field })
            if model == "beam" && field == "missing"
    ));
}

#[test]
fn unknown_layout_and_unknown_view() {
    let (schema, store) = setup();
    assert!(matches!(
        resolve_view(&schema, "odd", &store).unwrap_err(),
        LayoutError::UnknownLayout(_)
    ));
    assert!(matches!(
        resolve_view(&schema, "nope", &store).unwrap_err(),
        LayoutError::Schema(_)
    ));
}
