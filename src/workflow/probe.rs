//! Connectivity probes: one trial call against a provider endpoint.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::schema::SlotConfig;
use crate::form::ConfigDraft;

/// Why a probe did not succeed.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProbeError {
    #[error("provider unreachable: {0}")]
    Unreachable(String),

    #[error("provider rejected the configuration (status {0})")]
    Rejected(u16),

    #[error("probe timed out")]
    Timeout,
}

/// A single trial call used to verify a candidate configuration without
/// committing traffic to the provider.
#[async_trait]
pub trait ProviderProbe: Send + Sync {
    async fn probe(&self, slot: &SlotConfig, config: &ConfigDraft) -> Result<(), ProbeError>;
}

/// Probe over HTTP: posts the candidate configuration to the slot's probe
/// endpoint and treats any 2xx as reachable-and-accepted.
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

#[async_trait]
impl ProviderProbe for HttpProbe {
    async fn probe(&self, slot: &SlotConfig, config: &ConfigDraft) -> Result<(), ProbeError> {
        tracing::debug!(slot = %slot.name, url = %slot.probe_url, "Probing provider");

        let response = self
            .client
            .post(&slot.probe_url)
            .json(config)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProbeError::Timeout
                } else {
                    ProbeError::Unreachable(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ProbeError::Rejected(status.as_u16()))
        }
    }
}
