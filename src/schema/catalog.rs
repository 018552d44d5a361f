//! Schema catalog: provider type → field schema.

use std::collections::HashMap;

use crate::schema::field::{FieldDescriptor, FieldType, ProviderSchema, SelectOption};

/// Immutable lookup of provider schemas, built once at startup from the
/// built-in set plus any schemas declared in the service config.
#[derive(Debug, Clone)]
pub struct SchemaCatalog {
    schemas: HashMap<String, ProviderSchema>,
}

impl SchemaCatalog {
    /// The schemas the platform ships with.
    pub fn builtin() -> Self {
        let mut schemas = HashMap::new();
        for schema in builtin_schemas() {
            schemas.insert(schema.provider_type.clone(), schema);
        }
        Self { schemas }
    }

    /// Built-in catalog with config-declared schemas merged over it.
    /// A declared schema replaces a built-in of the same provider type.
    pub fn with_declared(declared: &[ProviderSchema]) -> Self {
        let mut catalog = Self::builtin();
        for schema in declared {
            catalog
                .schemas
                .insert(schema.provider_type.clone(), schema.clone());
        }
        catalog
    }

    pub fn get(&self, provider_type: &str) -> Option<&ProviderSchema> {
        self.schemas.get(provider_type)
    }

    pub fn provider_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}

fn builtin_schemas() -> Vec<ProviderSchema> {
    vec![
        ProviderSchema::new(
            "telephony-trunk",
            vec![
                FieldDescriptor::new("account_sid", "Account SID", FieldType::Text)
                    .required()
                    .placeholder("ACxxxxxxxxxxxxxxxx"),
                FieldDescriptor::new("auth_token", "Auth token", FieldType::Secret).required(),
                FieldDescriptor::new("trunk_domain", "Trunk domain", FieldType::Text)
                    .required()
                    .help("SIP trunk termination domain"),
                FieldDescriptor::new("region", "Region", FieldType::Select)
                    .required()
                    .options(vec![
                        SelectOption::new("us-east", "US East"),
                        SelectOption::new("us-west", "US West"),
                        SelectOption::new("eu-central", "EU Central"),
                    ]),
                FieldDescriptor::new("max_channels", "Max concurrent channels", FieldType::Number)
                    .bounds(1.0, 500.0, Some(1.0)),
            ],
        ),
        ProviderSchema::new(
            "voice-gateway",
            vec![
                FieldDescriptor::new("api_key", "API key", FieldType::Secret).required(),
                FieldDescriptor::new("voice_id", "Voice", FieldType::Select)
                    .required()
                    .options(vec![
                        SelectOption::new("aria", "Aria (neutral)"),
                        SelectOption::new("baritone", "Baritone (warm)"),
                        SelectOption::new("clara", "Clara (bright)"),
                    ]),
                FieldDescriptor::new("sample_rate", "Sample rate (Hz)", FieldType::Number)
                    .bounds(8000.0, 48000.0, Some(8000.0))
                    .help("Telephony audio is typically 8000 Hz"),
            ],
        ),
        ProviderSchema::new(
            "llm-completion",
            vec![
                FieldDescriptor::new("api_key", "API key", FieldType::Secret).required(),
                FieldDescriptor::new("model", "Model", FieldType::Text)
                    .required()
                    .placeholder("vendor/model-name"),
                FieldDescriptor::new("temperature", "Temperature", FieldType::Number)
                    .bounds(0.0, 2.0, Some(0.1)),
                FieldDescriptor::new("system_prompt", "System prompt", FieldType::Multiline)
                    .help("Prepended to every agent-assist request"),
            ],
        ),
    ]
}
