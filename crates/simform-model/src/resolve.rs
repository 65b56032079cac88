//! Resolution of dependencies into live, typed field bindings.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;
use simform_schema::{FieldSchema, SchemaError, SchemaStore};

use crate::dependency::Dependency;
use crate::error::{InvalidField, ModelError, Result};
use crate::source::ModelValues;
use crate::store::ModelStore;
use crate::validate::{FieldError, validate_field};

/// Read/write access to model values, as seen by resolved dependencies.
pub trait ModelAccess {
    /// Current values of one model.
    fn read_model(&self, name: &str) -> Result<ModelValues>;

    /// Replace one model's values.
    fn write_model(&self, name: &str, values: ModelValues) -> Result<()>;
}

impl ModelAccess for ModelStore {
    fn read_model(&self, name: &str) -> Result<ModelValues> {
        self.get_model(name)
    }

    fn write_model(&self, name: &str, values: ModelValues) -> Result<()> {
        self.update_model(name, values)
    }
}

/// A handle back to a live model, used to write field edits.
#[derive(Clone, Copy)]
pub struct ModelHandle<'a> {
    name: &'a str,
    access: &'a dyn ModelAccess,
}

impl<'a> ModelHandle<'a> {
    pub fn new(name: &'a str, access: &'a dyn ModelAccess) -> Self {
        Self { name, access }
    }

    /// The model's name.
    pub fn name(&self) -> &str {
        self.name
    }

    /// Current values of the model.
    pub fn values(&self) -> Result<ModelValues> {
        self.access.read_model(self.name)
    }

    /// Set one field, replacing the model with the edited copy.
    pub fn set_field(&self, field: &str, value: Value) -> Result<()> {
        let mut values = self.access.read_model(self.name)?;
        values.insert(field.to_string(), value);
        self.access.write_model(self.name, values)
    }
}

impl fmt::Debug for ModelHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHandle").field("name", &self.name).finish()
    }
}

/// A dependency bound to its current value and schema metadata.
///
/// Ephemeral: recompute it whenever the underlying models change.
#[derive(Debug, Clone)]
pub struct ResolvedDependency<'a> {
    pub dependency: Dependency,
    pub value: Value,
    pub field: &'a FieldSchema,
    pub error: Option<FieldError>,
    pub model: ModelHandle<'a>,
}

impl ResolvedDependency<'_> {
    /// The field's display label.
    pub fn display_name(&self) -> &str {
        &self.field.display_name
    }

    /// Whether the current value passes field validation.
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    /// Write a new value for this field.
    pub fn set_value(&self, value: Value) -> Result<()> {
        self.model.set_field(&self.dependency.field_name, value)
    }
}

/// The resolved bindings for one view or form.
#[derive(Debug, Clone, Default)]
pub struct ResolvedGroup<'a> {
    items: Vec<ResolvedDependency<'a>>,
}

impl<'a> ResolvedGroup<'a> {
    /// Find a binding by structural equality.
    pub fn get(&self, dependency: &Dependency) -> Option<&ResolvedDependency<'a>> {
        self.items.iter().find(|r| &r.dependency == dependency)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedDependency<'a>> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether every binding is valid. An empty group is valid.
    pub fn is_valid(&self) -> bool {
        self.items.iter().all(ResolvedDependency::is_valid)
    }

    /// Bindings that failed validation.
    pub fn invalid_fields(&self) -> Vec<InvalidField> {
        self.items
            .iter()
            .filter_map(|r| {
                r.error.clone().map(|error| InvalidField {
                    dependency: r.dependency.clone(),
                    error,
                })
            })
            .collect()
    }

    /// Distinct model names, in first-referenced order.
    pub fn model_names(&self) -> Vec<String> {
        distinct_models(self.items.iter().map(|r| &r.dependency))
    }
}

/// Resolve a group of dependencies against the models and the schema.
///
/// Each distinct model is read once however many of its fields are
/// referenced. Wildcard dependencies expand to every field the schema
/// declares for the model.
///
/// # Errors
///
/// A dependency naming a field the schema does not define fails with
/// [`ModelError::MissingField`]; model read failures are propagated.
pub fn resolve_group<'a>(
    dependencies: &[Dependency],
    models: &'a dyn ModelAccess,
    schema: &'a SchemaStore,
) -> Result<ResolvedGroup<'a>> {
    let doc = schema.schema()?;
    let model_names = distinct_models(dependencies.iter());
    let mut slices: BTreeMap<&'a str, ModelValues> = BTreeMap::new();
    for name in &model_names {
        let key = doc
            .models
            .get_key_value(name.as_str())
            .map(|(key, _)| key.as_str())
            .ok_or_else(|| {
                let field = dependencies
                    .iter()
                    .find(|d| &d.model_name == name)
                    .map(|d| d.field_name.clone())
                    .unwrap_or_default();
                ModelError::MissingField {
                    model: name.clone(),
                    field,
                }
            })?;
        slices.insert(key, models.read_model(key)?);
    }

    let mut group = ResolvedGroup::default();
    for dependency in dependencies {
        let Some((&model_name, values)) = slices.get_key_value(dependency.model_name.as_str())
        else {
            return Err(ModelError::UnknownModel(dependency.model_name.clone()));
        };
        let expanded: Vec<(Dependency, &'a FieldSchema)> = if dependency.is_wildcard() {
            schema
                .model(model_name)?
                .iter()
                .map(|(name, field)| (Dependency::new(model_name, name.as_str()), field))
                .collect()
        } else {
            let field = schema
                .field(model_name, &dependency.field_name)
                .map_err(|err| match err {
                    SchemaError::FieldNotFound { model, field } => {
                        ModelError::MissingField { model, field }
                    }
                    other => ModelError::Schema(other),
                })?;
            vec![(dependency.clone(), field)]
        };

        for (dependency, field) in expanded {
            if group.get(&dependency).is_some() {
                continue;
            }
            let value = values
                .get(&dependency.field_name)
                .cloned()
                .unwrap_or_else(|| field.default_value.clone());
            let error = validate_field(&value, field, doc).err();
            group.items.push(ResolvedDependency {
                dependency,
                value,
                field,
                error,
                model: ModelHandle::new(model_name, models),
            });
        }
    }
    tracing::debug!(
        "Resolved {} fields across {} models",
        group.len(),
        model_names.len()
    );
    Ok(group)
}

pub(crate) fn distinct_models<'d>(dependencies: impl Iterator<Item = &'d Dependency>) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for dependency in dependencies {
        if !names.contains(&dependency.model_name) {
            names.push(dependency.model_name.clone());
        }
    }
    names
}
