//! Field-level validation against the schema.

use serde_json::Value;
use simform_schema::{FieldKind, FieldSchema, Schema};
use thiserror::Error;

/// Why a field value is not acceptable.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum FieldError {
    #[error("a value is required")]
    Required,

    #[error("must be a number")]
    NotANumber,

    #[error("must be a whole number")]
    NotAnInteger,

    #[error("must be at least {min}")]
    BelowMinimum { min: f64 },

    #[error("must be at most {max}")]
    AboveMaximum { max: f64 },

    #[error("must be true or false")]
    NotABoolean,

    #[error("must be text")]
    NotAString,

    #[error("'{value}' is not a valid {enum_name}")]
    NotInEnum { enum_name: String, value: String },
}

/// Check a value against its field definition.
pub fn validate_field(
    value: &Value,
    field: &FieldSchema,
    schema: &Schema,
) -> Result<(), FieldError> {
    match schema.field_kind(field) {
        FieldKind::Integer => {
            let number = as_number(value)?;
            if number.fract() != 0.0 {
                return Err(FieldError::NotAnInteger);
            }
            check_bounds(number, field)
        }
        FieldKind::Float => check_bounds(as_number(value)?, field),
        FieldKind::Boolean => match value {
            Value::Bool(_) => Ok(()),
            Value::Number(n) if n.as_u64().is_some_and(|n| n <= 1) => Ok(()),
            Value::String(s) if matches!(s.as_str(), "0" | "1" | "true" | "false") => Ok(()),
            _ => Err(FieldError::NotABoolean),
        },
        FieldKind::String => match value {
            Value::String(s) if !s.trim().is_empty() => Ok(()),
            Value::Null | Value::String(_) => Err(FieldError::Required),
            _ => Err(FieldError::NotAString),
        },
        FieldKind::OptionalString => match value {
            Value::Null | Value::String(_) => Ok(()),
            _ => Err(FieldError::NotAString),
        },
        FieldKind::Enum(enum_name) => {
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Null => return Err(FieldError::Required),
                other => other.to_string(),
            };
            let known = schema
                .enums
                .get(&enum_name)
                .is_some_and(|entries| entries.iter().any(|e| e.value == text));
            if known {
                Ok(())
            } else {
                Err(FieldError::NotInEnum {
                    enum_name,
                    value: text,
                })
            }
        }
        FieldKind::Other(_) => Ok(()),
    }
}

fn as_number(value: &Value) -> Result<f64, FieldError> {
    let number: f64 = match value {
        Value::Null => Err(FieldError::Required),
        Value::Number(n) => n.as_f64().ok_or(FieldError::NotANumber),
        Value::String(s) if s.trim().is_empty() => Err(FieldError::Required),
        Value::String(s) => s.trim().parse().map_err(|_| FieldError::NotANumber),
        _ => Err(FieldError::NotANumber),
    }?;
    if number.is_finite() {
        Ok(number)
    } else {
        Err(FieldError::NotANumber)
    }
}

fn check_bounds(number: f64, field: &FieldSchema) -> Result<(), FieldError> {
    if let Some(min) = field.min {
        if number < min {
            return Err(FieldError::BelowMinimum { min });
        }
    }
    if let Some(max) = field.max {
        if number > max {
            return Err(FieldError::AboveMaximum { max });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use simform_schema::EnumEntry;

    fn schema() -> Schema {
        let mut schema = Schema::default();
        schema.enums.insert(
            "Shape".to_string(),
            vec![EnumEntry {
                value: "circle".to_string(),
                label: "Circle".to_string(),
            }],
        );
        schema
    }

    #[test]
    fn test_numeric_bounds() {
        let field = FieldSchema::new("Size", "Float", json!(1.0)).with_bounds(Some(0.0), Some(10.0));
        let schema = schema();
        assert!(validate_field(&json!(5.5), &field, &schema).is_ok());
        assert!(validate_field(&json!("2.5"), &field, &schema).is_ok());
        assert_eq!(
            validate_field(&json!(-1), &field, &schema),
            Err(FieldError::BelowMinimum { min: 0.0 })
        );
        assert_eq!(
            validate_field(&json!(11), &field, &schema),
            Err(FieldError::AboveMaximum { max: 10.0 })
        );
        assert_eq!(
            validate_field(&json!("abc"), &field, &schema),
            Err(FieldError::NotANumber)
        );
        assert_eq!(
            validate_field(&json!(""), &field, &schema),
            Err(FieldError::Required)
        );
    }

    #[test]
    fn test_non_finite_numbers_rejected() {
        let schema = schema();
        let bounded =
            FieldSchema::new("Energy", "Float", json!(1.0)).with_bounds(Some(0.0), Some(10.0));
        let free = FieldSchema::new("Offset", "Float", json!(0.0));
        for text in ["NaN", "inf", "-inf", "infinity"] {
            assert_eq!(
                validate_field(&json!(text), &bounded, &schema),
                Err(FieldError::NotANumber),
                "{text}"
            );
            assert_eq!(
                validate_field(&json!(text), &free, &schema),
                Err(FieldError::NotANumber),
                "{text}"
            );
        }
    }

    #[test]
    fn test_integer() {
        let field = FieldSchema::new("Count", "Integer", json!(1));
        let schema = schema();
        assert!(validate_field(&json!(3), &field, &schema).is_ok());
        assert_eq!(
            validate_field(&json!(3.5), &field, &schema),
            Err(FieldError::NotAnInteger)
        );
    }

    #[test]
    fn test_strings() {
        let schema = schema();
        let required = FieldSchema::new("Name", "String", json!(""));
        let optional = FieldSchema::new("Notes", "OptionalString", json!(""));
        assert_eq!(
            validate_field(&json!("  "), &required, &schema),
            Err(FieldError::Required)
        );
        assert!(validate_field(&json!(""), &optional, &schema).is_ok());
        assert!(validate_field(&json!(null), &optional, &schema).is_ok());
    }

    #[test]
    fn test_boolean() {
        let schema = schema();
        let field = FieldSchema::new("Enabled", "Boolean", json!("1"));
        assert!(validate_field(&json!("0"), &field, &schema).is_ok());
        assert!(validate_field(&json!(true), &field, &schema).is_ok());
        assert_eq!(
            validate_field(&json!("yes"), &field, &schema),
            Err(FieldError::NotABoolean)
        );
    }

    #[test]
    fn test_enum() {
        let schema = schema();
        let field = FieldSchema::new("Shape", "Shape", json!("circle"));
        assert!(validate_field(&json!("circle"), &field, &schema).is_ok());
        assert!(matches!(
            validate_field(&json!("hexagon"), &field, &schema),
            Err(FieldError::NotInEnum { .. })
        ));
    }

    #[test]
    fn test_unknown_types_accept_anything() {
        let schema = schema();
        let field = FieldSchema::new("Seed", "RandomSeed", json!(null));
        assert!(validate_field(&json!([1, 2]), &field, &schema).is_ok());
    }
}
