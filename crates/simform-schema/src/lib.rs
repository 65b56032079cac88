//! Declarative schema for simulation forms.
//!
//! A schema names the models of a simulation type and describes each field
//! (label, type, default, bounds), the enums field types refer to, the views
//! that arrange fields on screen and the application's named routes.
//!
//! The [`SchemaStore`] is created once at startup, initialized exactly once,
//! and then shared by reference with every consumer.
//!
//! # Example
//!
//! ```
//! use simform_schema::SchemaStore;
//!
//! let store = SchemaStore::new();
//! store
//!     .init_from_json(
//!         "demo",
//!         r#"{"models": {"beam": {"energy": ["Energy [GeV]", "Float", 3.0, "", 0, 100]}}}"#,
//!     )
//!     .unwrap();
//!
//! let field = store.field("beam", "energy").unwrap();
//! assert_eq!(field.display_name, "Energy [GeV]");
//! assert!(store.field("beam", "charge").is_err());
//! ```

pub mod error;
pub mod store;
pub mod types;

pub use error::{Result, SchemaError};
pub use store::SchemaStore;
pub use types::{EnumEntry, FieldKind, FieldSchema, ModelSchema, Schema};
