//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (slots reference existing schemas, backup
//!   references existing slots)
//! - Validate value ranges (thresholds > 0, probe URLs parse)
//! - Enforce schema invariants (unique field keys, select options present)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure: GateConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use url::Url;

use crate::config::schema::GateConfig;
use crate::schema::SchemaCatalog;

/// A single semantic problem found in a configuration file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("duplicate slot name: {0}")]
    DuplicateSlot(String),

    #[error("slot {slot}: unknown provider type {provider_type}")]
    UnknownProviderType { slot: String, provider_type: String },

    #[error("slot {slot}: backup references unknown slot {backup}")]
    DanglingBackup { slot: String, backup: String },

    #[error("slot {slot}: backup references itself")]
    SelfBackup { slot: String },

    #[error("slot {slot}: invalid probe URL {url}")]
    InvalidProbeUrl { slot: String, url: String },

    #[error("schema {provider_type}: duplicate field key {key}")]
    DuplicateFieldKey { provider_type: String, key: String },

    #[error("schema {provider_type}: select field {key} has no options")]
    EmptySelectOptions { provider_type: String, key: String },

    #[error("breaker failure_threshold must be at least 1")]
    ZeroFailureThreshold,

    #[error("invalid persistence backend URL: {0}")]
    InvalidBackendUrl(String),
}

/// Validate a parsed configuration, returning every problem found.
pub fn validate_config(config: &GateConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.breaker.failure_threshold == 0 {
        errors.push(ValidationError::ZeroFailureThreshold);
    }

    if let Some(url) = &config.persistence.backend_url {
        if Url::parse(url).is_err() {
            errors.push(ValidationError::InvalidBackendUrl(url.clone()));
        }
    }

    // Schema invariants for declared schemas. Built-ins are checked by their
    // own unit tests; the catalog merge happens after validation passes.
    for schema in &config.schemas {
        let mut keys = HashSet::new();
        for field in &schema.fields {
            if !keys.insert(field.key.as_str()) {
                errors.push(ValidationError::DuplicateFieldKey {
                    provider_type: schema.provider_type.clone(),
                    key: field.key.clone(),
                });
            }
            if field.field_type.is_select() && field.options.is_empty() {
                errors.push(ValidationError::EmptySelectOptions {
                    provider_type: schema.provider_type.clone(),
                    key: field.key.clone(),
                });
            }
        }
    }

    let catalog = SchemaCatalog::with_declared(&config.schemas);
    let mut slot_names = HashSet::new();
    for slot in &config.slots {
        if !slot_names.insert(slot.name.as_str()) {
            errors.push(ValidationError::DuplicateSlot(slot.name.clone()));
        }
        if catalog.get(&slot.provider_type).is_none() {
            errors.push(ValidationError::UnknownProviderType {
                slot: slot.name.clone(),
                provider_type: slot.provider_type.clone(),
            });
        }
        if Url::parse(&slot.probe_url).is_err() {
            errors.push(ValidationError::InvalidProbeUrl {
                slot: slot.name.clone(),
                url: slot.probe_url.clone(),
            });
        }
    }

    for slot in &config.slots {
        if let Some(backup) = &slot.backup {
            if backup == &slot.name {
                errors.push(ValidationError::SelfBackup {
                    slot: slot.name.clone(),
                });
            } else if !slot_names.contains(backup.as_str()) {
                errors.push(ValidationError::DanglingBackup {
                    slot: slot.name.clone(),
                    backup: backup.clone(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
