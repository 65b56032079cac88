//! Resolution of schema views into layouts and bound field groups.

use serde_json::Value;
use simform_model::{Dependency, ModelAccess, ResolvedGroup, resolve_group};
use simform_schema::SchemaStore;

use crate::error::{LayoutError, Result};
use crate::layout::{LayoutConfig, ListConfig, PanelConfig, TabConfig, TabsConfig};
use crate::render::RenderNode;

/// A view's layout together with its resolved bindings.
#[derive(Debug, Clone)]
pub struct ResolvedView<'a> {
    pub name: String,
    pub layout: LayoutConfig,
    pub group: ResolvedGroup<'a>,
}

impl ResolvedView<'_> {
    pub fn render(&self) -> Result<RenderNode> {
        self.layout.render(&self.group)
    }

    pub fn is_valid(&self) -> bool {
        self.group.is_valid()
    }
}

/// Build the layout for a named view entry.
///
/// Views carrying a `layout` key are parsed directly. Older views list
/// `basic` and `advanced` fields instead; those become a panel of lists, with
/// bare field names qualified by the view's `model` (or the view name).
pub fn layout_for_view(view_name: &str, view: &Value) -> Result<LayoutConfig> {
    if view.get("layout").is_some() {
        return LayoutConfig::from_value(view);
    }
    if view.get("basic").is_none() && view.get("advanced").is_none() {
        return Err(LayoutError::MissingLayout(view_name.to_string()));
    }

    let model = view
        .get("model")
        .and_then(Value::as_str)
        .unwrap_or(view_name);
    let title = view.get("title").and_then(Value::as_str).map(str::to_string);
    Ok(LayoutConfig::Panel(PanelConfig {
        title,
        basic: legacy_section(view_name, model, view.get("basic"))?,
        advanced: legacy_section(view_name, model, view.get("advanced"))?,
    }))
}

// A section is a list of field names, optionally followed by
// `[tab name, [fields]]` pairs which become tabs.
fn legacy_section(
    view_name: &str,
    model: &str,
    section: Option<&Value>,
) -> Result<Vec<LayoutConfig>> {
    let Some(entries) = section.and_then(Value::as_array) else {
        return Ok(Vec::new());
    };
    let mut fields = Vec::new();
    let mut tabs = Vec::new();
    for entry in entries {
        match entry {
            Value::String(field) => fields.push(qualify(model, field)),
            Value::Array(pair) => match pair.as_slice() {
                [Value::String(name), Value::Array(tab_fields)] => tabs.push(TabConfig {
                    name: name.clone(),
                    items: vec![LayoutConfig::List(ListConfig {
                        fields: tab_fields
                            .iter()
                            .filter_map(Value::as_str)
                            .map(|f| qualify(model, f))
                            .collect(),
                    })],
                }),
                _ => return Err(invalid_entry(view_name, entry)),
            },
            other => return Err(invalid_entry(view_name, other)),
        }
    }

    let mut out = Vec::new();
    if !fields.is_empty() {
        out.push(LayoutConfig::List(ListConfig { fields }));
    }
    if !tabs.is_empty() {
        out.push(LayoutConfig::Tabs(TabsConfig { tabs }));
    }
    Ok(out)
}

fn invalid_entry(view_name: &str, entry: &Value) -> LayoutError {
    LayoutError::InvalidView {
        view: view_name.to_string(),
        entry: entry.to_string(),
    }
}

fn qualify(model: &str, field: &str) -> String {
    if field.contains('.') {
        field.to_string()
    } else {
        format!("{model}.{field}")
    }
}

/// The parsed dependencies of a schema view, in layout order.
pub fn view_dependencies(schema: &SchemaStore, view_name: &str) -> Result<Vec<Dependency>> {
    let layout = layout_for_view(view_name, schema.view(view_name)?)?;
    Ok(Dependency::parse_all(&layout.dependencies())?)
}

/// Resolve a schema view: parse its layout, flatten the dependencies and
/// bind them as one group against the current models.
pub fn resolve_view<'a>(
    schema: &'a SchemaStore,
    view_name: &str,
    models: &'a dyn ModelAccess,
) -> Result<ResolvedView<'a>> {
    let layout = layout_for_view(view_name, schema.view(view_name)?)?;
    let dependencies = Dependency::parse_all(&layout.dependencies())?;
    let group = resolve_group(&dependencies, models, schema)?;
    tracing::debug!(
        "Resolved view '{}' ({} layout, {} fields)",
        view_name,
        layout.kind(),
        group.len()
    );
    Ok(ResolvedView {
        name: view_name.to_string(),
        layout,
        group,
    })
}
