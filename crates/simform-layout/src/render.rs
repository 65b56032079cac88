//! Render trees built from a layout and its resolved bindings.

use serde::Serialize;
use serde_json::Value;
use simform_model::{Dependency, FieldError, ResolvedDependency, ResolvedGroup};

use crate::error::{LayoutError, Result};
use crate::layout::LayoutConfig;

/// A single bound field, ready for a UI layer to draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldNode {
    pub dependency: Dependency,
    pub label: String,
    pub value: Value,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "error_message")]
    pub error: Option<FieldError>,
}

impl From<&ResolvedDependency<'_>> for FieldNode {
    fn from(resolved: &ResolvedDependency<'_>) -> Self {
        Self {
            dependency: resolved.dependency.clone(),
            label: resolved.display_name().to_string(),
            value: resolved.value.clone(),
            valid: resolved.is_valid(),
            error: resolved.error.clone(),
        }
    }
}

fn error_message<S: serde::Serializer>(
    error: &Option<FieldError>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match error {
        Some(error) => serializer.serialize_str(&error.to_string()),
        None => serializer.serialize_none(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridRowNode {
    pub label: String,
    /// One cell per column; `None` marks a blank cell.
    pub cells: Vec<Option<FieldNode>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TabNode {
    pub name: String,
    pub children: Vec<RenderNode>,
}

/// The rendered form of a layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "layout", rename_all = "lowercase")]
pub enum RenderNode {
    Grid {
        columns: Vec<String>,
        rows: Vec<GridRowNode>,
    },
    List {
        fields: Vec<FieldNode>,
    },
    Tabs {
        tabs: Vec<TabNode>,
    },
    Panel {
        title: Option<String>,
        basic: Vec<RenderNode>,
        advanced: Vec<RenderNode>,
    },
}

impl RenderNode {
    /// Every field node in the tree, depth first.
    pub fn fields(&self) -> Vec<&FieldNode> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'n>(&'n self, out: &mut Vec<&'n FieldNode>) {
        match self {
            Self::Grid { rows, .. } => {
                out.extend(rows.iter().flat_map(|row| row.cells.iter().flatten()));
            }
            Self::List { fields } => out.extend(fields),
            Self::Tabs { tabs } => {
                for child in tabs.iter().flat_map(|tab| &tab.children) {
                    child.collect_fields(out);
                }
            }
            Self::Panel {
                basic, advanced, ..
            } => {
                for child in basic.iter().chain(advanced) {
                    child.collect_fields(out);
                }
            }
        }
    }
}

impl LayoutConfig {
    /// Compose the render tree for this layout from a resolved group.
    ///
    /// The group must have been resolved from this layout's dependencies;
    /// a field missing from it fails with [`LayoutError::Unresolved`].
    pub fn render(&self, group: &ResolvedGroup<'_>) -> Result<RenderNode> {
        Ok(match self {
            Self::Grid(grid) => RenderNode::Grid {
                columns: grid.columns.clone(),
                rows: grid
                    .rows
                    .iter()
                    .map(|row| {
                        let cells = row
                            .fields
                            .iter()
                            .map(|cell| {
                                if cell.is_empty() {
                                    Ok(None)
                                } else {
                                    field_node(cell, group).map(Some)
                                }
                            })
                            .collect::<Result<_>>()?;
                        Ok(GridRowNode {
                            label: row.label.clone(),
                            cells,
                        })
                    })
                    .collect::<Result<_>>()?,
            },
            Self::List(list) => {
                let mut fields = Vec::new();
                for entry in &list.fields {
                    fields.extend(field_nodes(entry, group)?);
                }
                RenderNode::List { fields }
            }
            Self::Tabs(tabs) => RenderNode::Tabs {
                tabs: tabs
                    .tabs
                    .iter()
                    .map(|tab| {
                        Ok(TabNode {
                            name: tab.name.clone(),
                            children: render_all(&tab.items, group)?,
                        })
                    })
                    .collect::<Result<_>>()?,
            },
            Self::Panel(panel) => RenderNode::Panel {
                title: panel.title.clone(),
                basic: render_all(&panel.basic, group)?,
                advanced: render_all(&panel.advanced, group)?,
            },
        })
    }
}

fn render_all(items: &[LayoutConfig], group: &ResolvedGroup<'_>) -> Result<Vec<RenderNode>> {
    items.iter().map(|item| item.render(group)).collect()
}

fn field_node(entry: &str, group: &ResolvedGroup<'_>) -> Result<FieldNode> {
    let dependency = Dependency::parse(entry)?;
    group
        .get(&dependency)
        .map(FieldNode::from)
        .ok_or_else(|| LayoutError::Unresolved(entry.to_string()))
}

// Wildcards expand to every resolved field of the model, in group order.
fn field_nodes(entry: &str, group: &ResolvedGroup<'_>) -> Result<Vec<FieldNode>> {
    let dependency = Dependency::parse(entry)?;
    if !dependency.is_wildcard() {
        return field_node(entry, group).map(|node| vec![node]);
    }
    let nodes: Vec<FieldNode> = group
        .iter()
        .filter(|r| r.dependency.model_name == dependency.model_name)
        .map(FieldNode::from)
        .collect();
    if nodes.is_empty() {
        return Err(LayoutError::Unresolved(entry.to_string()));
    }
    Ok(nodes)
}
