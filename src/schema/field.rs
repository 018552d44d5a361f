//! Field descriptors: the data-only description of one configurable
//! provider attribute.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Input control kind for a configuration field.
///
/// Closed set: adding a variant is a compile-time-checked extension of the
/// form engine, never a stringly-typed fallthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldType {
    /// Single-line text input.
    #[default]
    Text,
    /// Credential input; values are write-only in the UI.
    Secret,
    /// Numeric input, optionally bounded by `min`/`max`/`step`.
    Number,
    /// Single choice from a fixed option list.
    Select,
    /// Multi-line text area.
    Multiline,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Secret => "secret",
            FieldType::Number => "number",
            FieldType::Select => "select",
            FieldType::Multiline => "multiline",
        }
    }

    /// The HTML-ish control a renderer should emit for this field.
    pub fn control(&self) -> &'static str {
        match self {
            FieldType::Text => "input-text",
            FieldType::Secret => "input-password",
            FieldType::Number => "input-number",
            FieldType::Select => "select",
            FieldType::Multiline => "textarea",
        }
    }

    pub fn is_select(&self) -> bool {
        matches!(self, FieldType::Select)
    }
}

impl Serialize for FieldType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        // Unrecognized types render as plain text inputs rather than failing
        // the whole schema fetch.
        Ok(match s.as_str() {
            "text" => FieldType::Text,
            "secret" => FieldType::Secret,
            "number" => FieldType::Number,
            "select" => FieldType::Select,
            "multiline" => FieldType::Multiline,
            _ => FieldType::Text,
        })
    }
}

/// One value/label pair for a select field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// One configurable attribute of a provider type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Unique key within the schema.
    pub key: String,

    /// Human-readable label.
    pub label: String,

    /// Input control kind; missing or unrecognized values fall back to text.
    #[serde(rename = "type", default)]
    pub field_type: FieldType,

    #[serde(default)]
    pub required: bool,

    /// Ordered option list; present only for select fields.
    #[serde(default)]
    pub options: Vec<SelectOption>,

    /// Lower bound for number fields.
    #[serde(default)]
    pub min: Option<f64>,

    /// Upper bound for number fields.
    #[serde(default)]
    pub max: Option<f64>,

    /// Step increment for number fields; values must be a step-multiple
    /// counted from `min` (or zero when no `min` is set).
    #[serde(default)]
    pub step: Option<f64>,

    #[serde(default)]
    pub help: Option<String>,

    #[serde(default)]
    pub placeholder: Option<String>,
}

impl FieldDescriptor {
    pub fn new(key: impl Into<String>, label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            field_type,
            required: false,
            options: Vec::new(),
            min: None,
            max: None,
            step: None,
            help: None,
            placeholder: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn options(mut self, options: Vec<SelectOption>) -> Self {
        self.options = options;
        self
    }

    pub fn bounds(mut self, min: f64, max: f64, step: Option<f64>) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self.step = step;
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }
}

/// Ordered field schema for one provider type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSchema {
    /// Provider type identifier (e.g., "voice-gateway").
    pub provider_type: String,

    /// Fields in rendering order.
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl ProviderSchema {
    pub fn new(provider_type: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            provider_type: provider_type.into(),
            fields,
        }
    }

    /// An empty schema: no configuration needed for this provider type.
    pub fn empty(provider_type: impl Into<String>) -> Self {
        Self::new(provider_type, Vec::new())
    }

    pub fn field(&self, key: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Check the schema invariants: unique keys, options on select fields.
    pub fn check_invariants(&self) -> Result<(), String> {
        let mut seen = std::collections::HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.key.as_str()) {
                return Err(format!(
                    "schema {}: duplicate field key {}",
                    self.provider_type, field.key
                ));
            }
            if field.field_type.is_select() && field.options.is_empty() {
                return Err(format!(
                    "schema {}: select field {} has no options",
                    self.provider_type, field.key
                ));
            }
        }
        Ok(())
    }
}
