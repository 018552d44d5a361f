//! Validation and rendering of configuration drafts against a schema.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::{FieldDescriptor, FieldType, ProviderSchema};

/// A candidate configuration: field key → raw value as the user typed it.
/// Values are strings or numbers; anything else fails validation.
pub type ConfigDraft = BTreeMap<String, Value>;

/// A field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    fn new(field: &str, reason: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// One entry of the form's render plan: the input element a UI must emit
/// for a field, in schema order.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedField {
    pub key: String,
    pub label: String,
    pub control: &'static str,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

/// Produce the ordered render plan for a schema: one element per field.
/// `None` (no schema for this provider type) renders as an empty form.
pub fn render_plan(schema: Option<&ProviderSchema>) -> Vec<RenderedField> {
    let Some(schema) = schema else {
        return Vec::new();
    };
    schema
        .fields
        .iter()
        .map(|f| RenderedField {
            key: f.key.clone(),
            label: f.label.clone(),
            control: f.field_type.control(),
            required: f.required,
            help: f.help.clone(),
            placeholder: f.placeholder.clone(),
        })
        .collect()
}

/// Validate a draft against a schema.
///
/// On success, returns the draft narrowed to the schema's keys: unknown
/// keys are dropped so a persisted configuration re-renders exactly the
/// fields the schema defines. On failure, returns every field error.
pub fn validate(
    schema: Option<&ProviderSchema>,
    draft: &ConfigDraft,
) -> Result<ConfigDraft, Vec<ValidationError>> {
    let Some(schema) = schema else {
        // No schema: nothing to configure, nothing to keep.
        return Ok(ConfigDraft::new());
    };

    let mut errors = Vec::new();
    let mut validated = ConfigDraft::new();

    for field in &schema.fields {
        let value = draft.get(&field.key);
        match check_field(field, value) {
            Ok(Some(value)) => {
                validated.insert(field.key.clone(), value);
            }
            Ok(None) => {}
            Err(e) => errors.push(e),
        }
    }

    if errors.is_empty() {
        Ok(validated)
    } else {
        Err(errors)
    }
}

/// Validate one field. `Ok(Some)` carries the value to keep, `Ok(None)`
/// means an optional field was left blank.
fn check_field(
    field: &FieldDescriptor,
    value: Option<&Value>,
) -> Result<Option<Value>, ValidationError> {
    let value = match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(v) => Some(v),
    };

    let Some(value) = value else {
        if field.required {
            return Err(ValidationError::new(&field.key, "value is required"));
        }
        return Ok(None);
    };

    match field.field_type {
        FieldType::Text | FieldType::Secret | FieldType::Multiline => match value {
            Value::String(_) => Ok(Some(value.clone())),
            other => Err(ValidationError::new(
                &field.key,
                format!("expected text, got {}", type_name(other)),
            )),
        },
        FieldType::Number => {
            let n = match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            };
            let Some(n) = n else {
                return Err(ValidationError::new(&field.key, "must be a number"));
            };
            if let Some(min) = field.min {
                if n < min {
                    return Err(ValidationError::new(
                        &field.key,
                        format!("must be at least {min}"),
                    ));
                }
            }
            if let Some(max) = field.max {
                if n > max {
                    return Err(ValidationError::new(
                        &field.key,
                        format!("must be at most {max}"),
                    ));
                }
            }
            if let Some(step) = field.step {
                let base = field.min.unwrap_or(0.0);
                let steps = (n - base) / step;
                if (steps - steps.round()).abs() > 1e-9 {
                    return Err(ValidationError::new(
                        &field.key,
                        format!("must be a multiple of {step}"),
                    ));
                }
            }
            Ok(Some(value.clone()))
        }
        FieldType::Select => {
            let Value::String(s) = value else {
                return Err(ValidationError::new(&field.key, "expected an option value"));
            };
            if field.options.iter().any(|o| &o.value == s) {
                Ok(Some(value.clone()))
            } else {
                Err(ValidationError::new(&field.key, "not one of the allowed options"))
            }
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "text",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
