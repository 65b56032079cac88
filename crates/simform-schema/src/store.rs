//! Process-wide schema store with a single-initialization guard.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use serde_json::{Map, Value};

use crate::error::{Result, SchemaError};
use crate::types::{EnumEntry, FieldKind, FieldSchema, ModelSchema, Schema};

#[derive(Debug)]
struct LoadedSchema {
    simulation_type: String,
    schema: Schema,
}

/// Holds the schema for the running application.
///
/// Constructed empty at startup and initialized exactly once; afterwards it
/// is read-only. Consumers receive it by reference.
#[derive(Debug, Default)]
pub struct SchemaStore {
    inner: OnceLock<LoadedSchema>,
}

impl SchemaStore {
    /// Create an uninitialized store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that is already initialized.
    pub fn with_schema(simulation_type: impl Into<String>, schema: Schema) -> Self {
        let store = Self::new();
        let _ = store.inner.set(LoadedSchema {
            simulation_type: simulation_type.into(),
            schema,
        });
        store
    }

    /// Install the schema.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::AlreadyInitialized`] if a schema is already present.
    pub fn init(&self, simulation_type: impl Into<String>, schema: Schema) -> Result<()> {
        let simulation_type = simulation_type.into();
        let model_count = schema.models.len();
        self.inner
            .set(LoadedSchema {
                simulation_type: simulation_type.clone(),
                schema,
            })
            .map_err(|rejected| SchemaError::AlreadyInitialized {
                simulation_type: self
                    .inner
                    .get()
                    .map_or(rejected.simulation_type, |s| s.simulation_type.clone()),
            })?;
        tracing::info!(
            "Initialized schema for {} ({} models)",
            simulation_type,
            model_count
        );
        Ok(())
    }

    /// Parse a raw JSON schema document and install it.
    pub fn init_from_json(&self, simulation_type: impl Into<String>, raw: &str) -> Result<()> {
        let schema = Schema::from_json(raw)?;
        self.init(simulation_type, schema)
    }

    /// Whether `init` has completed.
    pub fn is_initialized(&self) -> bool {
        self.inner.get().is_some()
    }

    fn loaded(&self) -> Result<&LoadedSchema> {
        self.inner.get().ok_or(SchemaError::NotInitialized)
    }

    /// The simulation type the schema was loaded for.
    pub fn simulation_type(&self) -> Result<&str> {
        Ok(&self.loaded()?.simulation_type)
    }

    /// The whole schema document.
    pub fn schema(&self) -> Result<&Schema> {
        Ok(&self.loaded()?.schema)
    }

    /// All model definitions.
    pub fn models(&self) -> Result<&BTreeMap<String, ModelSchema>> {
        Ok(&self.schema()?.models)
    }

    /// Look up a model definition.
    pub fn model(&self, name: &str) -> Result<&ModelSchema> {
        self.schema()?
            .models
            .get(name)
            .ok_or_else(|| SchemaError::not_found("model", name))
    }

    /// Look up a field definition.
    pub fn field(&self, model: &str, field: &str) -> Result<&FieldSchema> {
        self.model(model)?
            .get(field)
            .ok_or_else(|| SchemaError::FieldNotFound {
                model: model.to_string(),
                field: field.to_string(),
            })
    }

    /// Classify a field's type against this schema's enums.
    pub fn field_kind(&self, field: &FieldSchema) -> Result<FieldKind> {
        Ok(self.schema()?.field_kind(field))
    }

    /// Look up an enum's members.
    pub fn enum_values(&self, name: &str) -> Result<&[EnumEntry]> {
        self.schema()?
            .enums
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| SchemaError::not_found("enum", name))
    }

    /// Look up a view configuration.
    pub fn view(&self, name: &str) -> Result<&Value> {
        self.schema()?
            .views
            .get(name)
            .ok_or_else(|| SchemaError::not_found("view", name))
    }

    /// Look up a route template.
    pub fn route(&self, name: &str) -> Result<&str> {
        self.schema()?
            .routes
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| SchemaError::not_found("route", name))
    }

    /// Build a model from the schema defaults.
    pub fn default_model(&self, name: &str) -> Result<Map<String, Value>> {
        self.schema()?
            .default_model(name)
            .ok_or_else(|| SchemaError::not_found("model", name))
    }

    /// Expand a named route with parameters.
    ///
    /// Placeholders are written `:name` or `<name>`; a trailing `?` marks
    /// them optional, in which case a missing parameter drops the segment.
    pub fn format_route(&self, name: &str, params: &BTreeMap<String, String>) -> Result<String> {
        let template = self.route(name)?;
        let mut out = Vec::new();
        for segment in template.split('/') {
            let placeholder = segment
                .strip_prefix(':')
                .or_else(|| segment.strip_prefix('<').and_then(|s| s.strip_suffix('>')));
            let Some(placeholder) = placeholder else {
                out.push(segment.to_string());
                continue;
            };
            let (key, optional) = match placeholder.strip_suffix('?') {
                Some(key) => (key, true),
                None => (placeholder, false),
            };
            match params.get(key) {
                Some(value) => out.push(value.clone()),
                None if optional => {}
                None => {
                    return Err(SchemaError::MissingRouteParam {
                        route: name.to_string(),
                        param: key.to_string(),
                    });
                }
            }
        }
        Ok(out.join("/"))
    }
}
