//! Error types for server communication, polling and the frame cache.

use std::path::PathBuf;

use serde_json::{Map, Value};
use thiserror::Error;

/// Errors raised while talking to the simulation server.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// The request could not be sent or the connection failed.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("server returned {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// The response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// The server reported `state: "srException"`.
    ///
    /// Carries the route the host should redirect to.
    #[error("server exception, redirect to '{route}'")]
    ServerException {
        route: String,
        params: Map<String, Value>,
    },

    /// A run is still pending but the server gave no `nextRequest` token.
    #[error("run is '{state}' but the server sent no nextRequest")]
    MissingContinuation { state: String },

    /// Frame cache file operation failed.
    #[error("failed to {operation} {}: {source}", path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ClientError {
    /// Returns a user-friendly error message suitable for display in the UI.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::Network(_) => "Could not reach the simulation server. Check your connection.",
            Self::Http { status, .. } if *status >= 500 => {
                "The simulation server had a problem. Please try again."
            }
            Self::Http { .. } => "The simulation server rejected the request.",
            Self::ServerException { .. } => "The server could not complete the request.",
            Self::MissingContinuation { .. } => "Lost track of the running simulation.",
            Self::JsonParse(_) | Self::Io { .. } => "An unexpected error occurred.",
        }
    }

    /// Returns whether a retry might succeed. Nothing here retries on its own.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::JsonParse(err.to_string());
        }
        Self::Network(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonParse(err.to_string())
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
