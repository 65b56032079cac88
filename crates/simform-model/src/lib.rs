//! Reactive model state for simulation forms.
//!
//! This crate provides:
//!
//! - [`ModelStore`]: the keyed map of model values, with load/update/save,
//!   a saved baseline for dirty tracking, change notifications, and
//!   generation tickets that discard superseded loads
//! - [`Dependency`]: `model.field` references parsed from view configuration
//! - [`resolve_group`]: binds dependencies to their current values and
//!   schema metadata, reading each model once
//! - [`FormController`]: aggregate dirty/valid state with submit and cancel
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use simform_model::{Dependency, FormController, ModelStore, SimulationInfo};
//! use simform_schema::SchemaStore;
//!
//! let schema = SchemaStore::new();
//! schema
//!     .init_from_json("demo", r#"{"models": {"m1": {"f1": ["Field", "String", ""]}}}"#)
//!     .unwrap();
//!
//! let store = ModelStore::new();
//! let info: SimulationInfo = serde_json::from_value(json!({
//!     "simulationType": "demo",
//!     "models": {"simulation": {"simulationId": "123"}, "m1": {"f1": "a"}}
//! }))
//! .unwrap();
//! store.apply_load(store.begin_load(), info);
//!
//! let form = FormController::new(&store, &schema, vec![Dependency::parse("m1.f1").unwrap()]);
//! form.set_field(&Dependency::parse("m1.f1").unwrap(), json!("x")).unwrap();
//! assert!(form.is_form_state_dirty().unwrap());
//!
//! form.cancel_changes().unwrap();
//! assert_eq!(store.get_model("m1").unwrap()["f1"], json!("a"));
//! ```

pub mod dependency;
pub mod error;
pub mod form;
pub mod resolve;
pub mod source;
pub mod store;
pub mod validate;

pub use dependency::{Dependency, WILDCARD};
pub use error::{DependencyError, FormError, InvalidField, ModelError, Result};
pub use form::{FormController, FormState};
pub use resolve::{ModelAccess, ModelHandle, ResolvedDependency, ResolvedGroup, resolve_group};
pub use source::{ModelValues, SimulationInfo, SimulationSource, SourceError};
pub use store::{LoadOutcome, LoadTicket, ModelEvent, ModelStore};
pub use validate::{FieldError, validate_field};
