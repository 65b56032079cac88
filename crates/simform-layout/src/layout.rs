//! Layout kinds and their configuration.
//!
//! A layout node is written `{"layout": "<kind>", "config": {...}}`. The set
//! of kinds is closed; composite kinds (tabs, panel) contain further layout
//! nodes.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;
use simform_model::Dependency;

use crate::error::{LayoutError, Result};

/// The registered layout kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutKind {
    Grid,
    List,
    Tabs,
    Panel,
}

impl LayoutKind {
    /// Every registered kind.
    pub const ALL: [LayoutKind; 4] = [Self::Grid, Self::List, Self::Tabs, Self::Panel];

    /// Look up a kind by its configuration name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// The configuration name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Grid => "grid",
            Self::List => "list",
            Self::Tabs => "tabs",
            Self::Panel => "panel",
        }
    }

    /// Whether the kind contains nested layouts.
    pub const fn is_composite(&self) -> bool {
        matches!(self, Self::Tabs | Self::Panel)
    }
}

impl fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A table of fields: one row per label, one cell per column.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GridConfig {
    #[serde(default)]
    pub columns: Vec<String>,
    pub rows: Vec<GridRow>,
}

impl GridConfig {
    fn check_cells(&self) -> Result<()> {
        let wildcard = self
            .rows
            .iter()
            .flat_map(|row| &row.fields)
            .find(|cell| Dependency::parse(cell).is_ok_and(|dep| dep.is_wildcard()));
        match wildcard {
            Some(cell) => Err(LayoutError::WildcardCell(cell.clone())),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GridRow {
    #[serde(default)]
    pub label: String,
    /// Dependency strings, one per column. Empty strings leave a blank cell.
    pub fields: Vec<String>,
}

/// A vertical list of fields.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ListConfig {
    pub fields: Vec<String>,
}

/// Named tabs, each holding further layouts.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TabsConfig {
    pub tabs: Vec<TabConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TabConfig {
    pub name: String,
    pub items: Vec<LayoutConfig>,
}

/// A titled panel with basic and advanced layout groups.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct PanelConfig {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub basic: Vec<LayoutConfig>,
    #[serde(default)]
    pub advanced: Vec<LayoutConfig>,
}

/// One layout node.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub enum LayoutConfig {
    Grid(GridConfig),
    List(ListConfig),
    Tabs(TabsConfig),
    Panel(PanelConfig),
}

impl LayoutConfig {
    /// Parse a `{"layout": ..., "config": ...}` node.
    pub fn from_value(value: &Value) -> Result<Self> {
        let name = value
            .get("layout")
            .and_then(Value::as_str)
            .ok_or_else(|| LayoutError::UnknownLayout(value.get("layout").map_or_else(
                || "<missing>".to_string(),
                Value::to_string,
            )))?;
        let kind = LayoutKind::from_name(name)
            .ok_or_else(|| LayoutError::UnknownLayout(name.to_string()))?;
        let config = value
            .get("config")
            .cloned()
            .unwrap_or_else(|| Value::Object(Default::default()));
        let invalid = |source| LayoutError::InvalidConfig {
            kind: kind.name(),
            source,
        };
        Ok(match kind {
            LayoutKind::Grid => {
                let grid: GridConfig = serde_json::from_value(config).map_err(invalid)?;
                grid.check_cells()?;
                Self::Grid(grid)
            }
            LayoutKind::List => Self::List(serde_json::from_value(config).map_err(invalid)?),
            LayoutKind::Tabs => Self::Tabs(serde_json::from_value(config).map_err(invalid)?),
            LayoutKind::Panel => Self::Panel(serde_json::from_value(config).map_err(invalid)?),
        })
    }

    /// The node's kind.
    pub fn kind(&self) -> LayoutKind {
        match self {
            Self::Grid(_) => LayoutKind::Grid,
            Self::List(_) => LayoutKind::List,
            Self::Tabs(_) => LayoutKind::Tabs,
            Self::Panel(_) => LayoutKind::Panel,
        }
    }

    /// Dependency strings required by this node and its children, in order.
    pub fn dependencies(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_dependencies(&mut out);
        out
    }

    fn collect_dependencies(&self, out: &mut Vec<String>) {
        match self {
            Self::Grid(grid) => out.extend(
                grid.rows
                    .iter()
                    .flat_map(|row| row.fields.iter())
                    .filter(|f| !f.is_empty())
                    .cloned(),
            ),
            Self::List(list) => out.extend(list.fields.iter().cloned()),
            Self::Tabs(tabs) => {
                for tab in &tabs.tabs {
                    for item in &tab.items {
                        item.collect_dependencies(out);
                    }
                }
            }
            Self::Panel(panel) => {
                for item in panel.basic.iter().chain(&panel.advanced) {
                    item.collect_dependencies(out);
                }
            }
        }
    }
}

impl TryFrom<Value> for LayoutConfig {
    type Error = LayoutError;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_value(&value)
    }
}
