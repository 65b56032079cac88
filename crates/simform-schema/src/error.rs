//! Error types for schema loading and lookup.

use thiserror::Error;

/// Errors raised by the schema store.
///
/// Every variant indicates a configuration defect (a view or dependency that
/// names something the schema does not define). They are not meant to be
/// recovered from at runtime.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SchemaError {
    /// `init` was called on a store that already holds a schema.
    #[error("schema already initialized for simulation type '{simulation_type}'")]
    AlreadyInitialized { simulation_type: String },

    /// A read was attempted before `init`.
    #[error("schema has not been initialized")]
    NotInitialized,

    /// A named model, enum, view or route does not exist.
    #[error("{kind} '{name}' not found in schema")]
    NotFound { kind: &'static str, name: String },

    /// A field is not declared on its model.
    #[error("field '{field}' not found on model '{model}'")]
    FieldNotFound { model: String, field: String },

    /// A field entry could not be interpreted.
    #[error("invalid field definition: {0}")]
    InvalidField(String),

    /// A required route parameter was not supplied.
    #[error("route '{route}' requires parameter '{param}'")]
    MissingRouteParam { route: String, param: String },

    /// The raw schema document is not valid JSON for a schema.
    #[error("failed to parse schema: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
    },
}

impl SchemaError {
    pub(crate) fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }
}

/// Result type for schema operations.
pub type Result<T> = std::result::Result<T, SchemaError>;
