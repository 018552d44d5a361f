//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::schema::ProviderSchema;

/// Root configuration for the provider resilience service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GateConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// API authentication and request handling.
    pub api: ApiConfig,

    /// Circuit breaker policy applied to every slot.
    pub breaker: BreakerConfig,

    /// Connectivity probe settings.
    pub probe: ProbeConfig,

    /// Where activated provider configurations are persisted.
    pub persistence: PersistenceConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Provider schemas declared in the config file, merged over the
    /// built-in catalog (a declared schema replaces a built-in of the
    /// same provider type).
    #[serde(default)]
    pub schemas: Vec<ProviderSchema>,

    /// Provider slot definitions (primary and backup slots alike).
    #[serde(default)]
    pub slots: Vec<SlotConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Bearer token required on every /api route.
    pub api_key: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Circuit breaker policy.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Consecutive failures before a CLOSED circuit opens.
    pub failure_threshold: u32,

    /// Seconds an OPEN circuit waits before admitting a recovery probe.
    pub cooldown_secs: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown_secs: 60,
        }
    }
}

/// Connectivity probe configuration.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Probe request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

/// Persistence backend configuration.
///
/// When `backend_url` is unset, activated configurations are kept in an
/// in-process store (useful for development and tests).
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Base URL of the platform backend that owns Provider Configuration
    /// records (e.g., "http://backend:9000").
    pub backend_url: Option<String>,

    /// Bearer token presented to the persistence backend.
    pub backend_token: Option<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// A provider slot: one position in the platform's call-routing rotation.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SlotConfig {
    /// Unique slot identifier (e.g., "telephony-primary").
    pub name: String,

    /// Provider type this slot is configured for; must resolve to a schema
    /// in the catalog.
    pub provider_type: String,

    /// Endpoint the connectivity probe posts candidate configurations to.
    pub probe_url: String,

    /// Slot to fail over to while this one is not CLOSED.
    #[serde(default)]
    pub backup: Option<String>,
}
