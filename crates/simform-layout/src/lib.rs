//! Layout engine for simulation views.
//!
//! A view in the schema names a layout kind and its configuration. This
//! crate parses that configuration into a [`LayoutConfig`], flattens the
//! field dependencies it needs, resolves them as one group and composes a
//! UI-neutral [`RenderNode`] tree.

pub mod error;
pub mod layout;
pub mod render;
pub mod view;

pub use error::{LayoutError, Result};
pub use layout::{
    GridConfig, GridRow, LayoutConfig, LayoutKind, ListConfig, PanelConfig, TabConfig, TabsConfig,
};
pub use render::{FieldNode, GridRowNode, RenderNode, TabNode};
pub use view::{ResolvedView, layout_for_view, resolve_view, view_dependencies};
