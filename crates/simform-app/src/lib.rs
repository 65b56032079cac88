//! Application wiring for simulation form clients.
//!
//! [`AppContext`] owns the schema and model stores, the server client, the
//! frame cache and the poll registry. It is built once at startup from
//! [`Settings`] and handed to consumers by reference.

pub mod context;
pub mod error;
pub mod logging;
pub mod settings;

pub use context::AppContext;
pub use error::{AppError, Result};
pub use logging::{LogConfig, LogFormat, init_logging, init_logging_with_writer};
pub use settings::{FrameCacheSettings, LoggingSettings, PollingSettings, ServerSettings, Settings};
