//! Error types for the application context.

use std::path::PathBuf;

use simform_client::ClientError;
use simform_layout::LayoutError;
use simform_model::{FormError, ModelError};
use simform_schema::SchemaError;
use thiserror::Error;

/// Errors surfaced by [`AppContext`](crate::AppContext) and its settings.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("failed to {operation} {}: {source}", path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize settings: {0}")]
    SettingsSerialize(#[from] toml::ser::Error),

    #[error("failed to initialize logging: {0}")]
    Logging(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Result type for application operations.
pub type Result<T> = std::result::Result<T, AppError>;
