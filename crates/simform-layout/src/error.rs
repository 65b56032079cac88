//! Error types for layout parsing and rendering.

use simform_model::{DependencyError, ModelError};
use simform_schema::SchemaError;
use thiserror::Error;

/// Errors raised while interpreting view configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LayoutError {
    /// The `layout` name is not a registered layout kind.
    #[error("unknown layout '{0}'")]
    UnknownLayout(String),

    /// A view has neither a `layout` nor `basic`/`advanced` field lists.
    #[error("view '{0}' has no layout")]
    MissingLayout(String),

    /// The `config` of a layout does not match its kind.
    #[error("invalid {kind} layout config: {source}")]
    InvalidConfig {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A legacy `basic`/`advanced` entry is neither a field name nor a
    /// `[tab name, [fields]]` pair.
    #[error("view '{view}' has a malformed field entry {entry}")]
    InvalidView { view: String, entry: String },

    /// Grid cells hold exactly one field; `model.*` cannot fill a cell.
    #[error("grid cell '{0}' cannot be a wildcard")]
    WildcardCell(String),

    /// A layout references a dependency that was not resolved.
    #[error("dependency '{0}' was not resolved for this layout")]
    Unresolved(String),

    #[error(transparent)]
    Dependency(#[from] DependencyError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Result type for layout operations.
pub type Result<T> = std::result::Result<T, LayoutError>;
