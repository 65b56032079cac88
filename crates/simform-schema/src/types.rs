//! Schema document types.
//!
//! A schema describes the models of a simulation type (their fields, labels,
//! types and defaults), the enums those fields reference, the views that lay
//! fields out, and the named routes of the application.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SchemaError;

/// Fields of one model, keyed by field name.
pub type ModelSchema = BTreeMap<String, FieldSchema>;

/// The complete declarative schema for one simulation type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Schema {
    /// Model definitions keyed by model name.
    pub models: BTreeMap<String, ModelSchema>,
    /// Enumerations referenced by field types.
    #[serde(rename = "enum", alias = "enums")]
    pub enums: BTreeMap<String, Vec<EnumEntry>>,
    /// View configurations keyed by view name. Interpreted by the layout engine.
    #[serde(rename = "view", alias = "views")]
    pub views: BTreeMap<String, Value>,
    /// Route templates keyed by route name.
    #[serde(rename = "route", alias = "routes")]
    pub routes: BTreeMap<String, String>,
}

impl Schema {
    /// Parse a schema from its JSON document.
    pub fn from_json(raw: &str) -> crate::Result<Self> {
        serde_json::from_str(raw).map_err(|source| SchemaError::Parse { source })
    }

    /// Classify the declared type of a field.
    pub fn field_kind(&self, field: &FieldSchema) -> FieldKind {
        FieldKind::classify(&field.type_name, |name| self.enums.contains_key(name))
    }

    /// Build a model populated with every field's default value.
    pub fn default_model(&self, model: &str) -> Option<Map<String, Value>> {
        self.models.get(model).map(|fields| {
            fields
                .iter()
                .map(|(name, field)| (name.clone(), field.default_value.clone()))
                .collect()
        })
    }
}

/// One enum member: the stored value and its display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(Value, String)", into = "(String, String)")]
pub struct EnumEntry {
    pub value: String,
    pub label: String,
}

impl From<(Value, String)> for EnumEntry {
    fn from((value, label): (Value, String)) -> Self {
        let value = match value {
            Value::String(s) => s,
            other => other.to_string(),
        };
        Self { value, label }
    }
}

impl From<EnumEntry> for (String, String) {
    fn from(entry: EnumEntry) -> Self {
        (entry.value, entry.label)
    }
}

/// Definition of a single model field.
///
/// Accepts the compact positional form used by schema files,
/// `[label, type, default, description, min, max]` (trailing entries
/// optional), as well as a named object form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawField", rename_all = "camelCase")]
pub struct FieldSchema {
    pub display_name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub default_value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl FieldSchema {
    /// Create a field with a label, type and default value.
    pub fn new(
        display_name: impl Into<String>,
        type_name: impl Into<String>,
        default_value: Value,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            type_name: type_name.into(),
            default_value,
            description: None,
            min: None,
            max: None,
        }
    }

    /// Set the numeric bounds.
    #[must_use]
    pub fn with_bounds(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawField {
    Positional(Vec<Value>),
    Named {
        #[serde(rename = "displayName")]
        display_name: String,
        #[serde(rename = "type")]
        type_name: String,
        #[serde(default, rename = "defaultValue")]
        default_value: Value,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
}

impl TryFrom<RawField> for FieldSchema {
    type Error = SchemaError;

    fn try_from(raw: RawField) -> Result<Self, Self::Error> {
        match raw {
            RawField::Named {
                display_name,
                type_name,
                default_value,
                description,
                min,
                max,
            } => Ok(Self {
                display_name,
                type_name,
                default_value,
                description: description.filter(|d| !d.is_empty()),
                min,
                max,
            }),
            RawField::Positional(items) => {
                let mut items = items.into_iter();
                let display_name = match items.next() {
                    Some(Value::String(s)) => s,
                    other => {
                        return Err(SchemaError::InvalidField(format!(
                            "expected a label, found {other:?}"
                        )));
                    }
                };
                let type_name = match items.next() {
                    Some(Value::String(s)) => s,
                    other => {
                        return Err(SchemaError::InvalidField(format!(
                            "field '{display_name}' expected a type, found {other:?}"
                        )));
                    }
                };
                let default_value = items.next().unwrap_or(Value::Null);
                let description = match items.next() {
                    Some(Value::String(s)) if !s.is_empty() => Some(s),
                    _ => None,
                };
                let min = items.next().as_ref().and_then(bound);
                let max = items.next().as_ref().and_then(bound);
                Ok(Self {
                    display_name,
                    type_name,
                    default_value,
                    description,
                    min,
                    max,
                })
            }
        }
    }
}

fn bound(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Broad classification of a field's declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Float,
    Boolean,
    String,
    /// A string that may be left empty.
    OptionalString,
    /// Values drawn from the named enum.
    Enum(String),
    /// Any application-specific type this layer does not interpret.
    Other(String),
}

impl FieldKind {
    /// Classify a type name, using `is_enum` to recognise enum references.
    pub fn classify(type_name: &str, is_enum: impl Fn(&str) -> bool) -> Self {
        match type_name {
            "Integer" => Self::Integer,
            "Float" => Self::Float,
            "Boolean" => Self::Boolean,
            "String" | "Text" => Self::String,
            "OptionalString" => Self::OptionalString,
            name if is_enum(name) => Self::Enum(name.to_string()),
            name => Self::Other(name.to_string()),
        }
    }

    /// Whether values of this kind are numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_positional_field() {
        let field: FieldSchema =
            serde_json::from_value(json!(["Step size", "Float", 0.5, "", 0, 10])).unwrap();
        assert_eq!(field.display_name, "Step size");
        assert_eq!(field.type_name, "Float");
        assert_eq!(field.default_value, json!(0.5));
        assert_eq!(field.description, None);
        assert_eq!(field.min, Some(0.0));
        assert_eq!(field.max, Some(10.0));
    }

    #[test]
    fn test_short_positional_field() {
        let field: FieldSchema = serde_json::from_value(json!(["Name", "String"])).unwrap();
        assert_eq!(field.default_value, Value::Null);
        assert!(field.min.is_none());
    }

    #[test]
    fn test_named_field() {
        let field: FieldSchema = serde_json::from_value(json!({
            "displayName": "Count",
            "type": "Integer",
            "defaultValue": 3,
            "max": 5
        }))
        .unwrap();
        assert_eq!(field.type_name, "Integer");
        assert_eq!(field.max, Some(5.0));
    }

    #[test]
    fn test_positional_field_without_type_fails() {
        let result: Result<FieldSchema, _> = serde_json::from_value(json!(["Name"]));
        assert!(result.is_err());
    }

    #[test]
    fn test_enum_entry_numeric_value() {
        let entries: Vec<EnumEntry> =
            serde_json::from_value(json!([[1, "One"], ["two", "Two"]])).unwrap();
        assert_eq!(entries[0].value, "1");
        assert_eq!(entries[1].label, "Two");
    }

    #[test]
    fn test_field_kind() {
        let is_enum = |name: &str| name == "Shape";
        assert_eq!(FieldKind::classify("Integer", is_enum), FieldKind::Integer);
        assert_eq!(
            FieldKind::classify("Shape", is_enum),
            FieldKind::Enum("Shape".to_string())
        );
        assert_eq!(
            FieldKind::classify("RandomSeed", is_enum),
            FieldKind::Other("RandomSeed".to_string())
        );
        assert!(FieldKind::Float.is_numeric());
    }
}
