//! Error types for the model store, dependency resolution and forms.

use simform_schema::SchemaError;
use thiserror::Error;

use crate::dependency::Dependency;
use crate::source::SourceError;
use crate::validate::FieldError;

/// A dependency string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum DependencyError {
    /// Not of the form `model.field` (or `model.*`).
    #[error("malformed dependency '{input}': expected 'model.field'")]
    Malformed { input: String },
}

/// Errors raised by the model store and the dependency resolver.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ModelError {
    /// Models were read before a simulation was loaded.
    #[error("models have not been loaded")]
    NotLoaded,

    /// The named model is not present in the store.
    #[error("model '{0}' is not loaded")]
    UnknownModel(String),

    /// A dependency names a field the schema does not define.
    ///
    /// This is a configuration defect: a view and the schema disagree.
    #[error("field '{field}' is not defined on model '{model}'")]
    MissingField { model: String, field: String },

    /// A dependency string was malformed.
    #[error(transparent)]
    Dependency(#[from] DependencyError),

    /// Schema lookup failed for a reason other than a missing field.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The simulation source failed to fetch or save.
    #[error("simulation request failed: {source}")]
    Source {
        #[source]
        source: SourceError,
    },
}

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

/// A field that failed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidField {
    pub dependency: Dependency,
    pub error: FieldError,
}

/// Errors raised by a form session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FormError {
    /// Submission refused because one or more fields are invalid.
    #[error("form has invalid fields: {}", describe_fields(.fields))]
    Invalid { fields: Vec<InvalidField> },

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl FormError {
    /// The fields that blocked submission, if any.
    pub fn invalid_fields(&self) -> &[InvalidField] {
        match self {
            Self::Invalid { fields } => fields,
            Self::Model(_) => &[],
        }
    }
}

fn describe_fields(fields: &[InvalidField]) -> String {
    fields
        .iter()
        .map(|f| format!("{} ({})", f.dependency, f.error))
        .collect::<Vec<_>>()
        .join(", ")
}
