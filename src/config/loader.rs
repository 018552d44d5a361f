//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::GateConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GateConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: GateConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_parses_with_defaults() {
        let toml = r#"
            [listener]
            bind_address = "127.0.0.1:8080"

            [[slots]]
            name = "voice-primary"
            provider_type = "voice-gateway"
            probe_url = "http://127.0.0.1:9001/health"
        "#;
        let config: GateConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.breaker.failure_threshold, 5);
        assert_eq!(config.breaker.cooldown_secs, 60);
        assert_eq!(config.slots.len(), 1);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn declared_schema_with_backup_slot() {
        let toml = r#"
            [[schemas]]
            provider_type = "sms-relay"

            [[schemas.fields]]
            key = "api_key"
            label = "API key"
            type = "secret"
            required = true

            [[slots]]
            name = "sms-primary"
            provider_type = "sms-relay"
            probe_url = "http://127.0.0.1:9001/health"
            backup = "sms-backup"

            [[slots]]
            name = "sms-backup"
            provider_type = "sms-relay"
            probe_url = "http://127.0.0.1:9002/health"
        "#;
        let config: GateConfig = toml::from_str(toml).unwrap();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.slots[0].backup.as_deref(), Some("sms-backup"));
    }
}
