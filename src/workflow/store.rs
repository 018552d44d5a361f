//! Persistence of activated provider configurations.
//!
//! The platform backend owns Provider Configuration records; this module
//! only writes and reads them. An in-process store backs development and
//! tests when no backend is configured.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::form::ConfigDraft;

/// Persistence failure modes.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// The backend refused the write (conflicting slot, stale revision...).
    /// The caller keeps the draft and may retry.
    #[error("backend rejected the write: {0}")]
    Rejected(String),

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Where activated configurations live.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Persist `config` as the active configuration for `slot`,
    /// replacing any previous one.
    async fn save(&self, slot: &str, config: ConfigDraft) -> Result<(), StoreError>;

    /// The active configuration for `slot`, if one has been saved.
    async fn load(&self, slot: &str) -> Result<Option<ConfigDraft>, StoreError>;
}

/// In-process store used when no persistence backend is configured.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, ConfigDraft>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn save(&self, slot: &str, config: ConfigDraft) -> Result<(), StoreError> {
        self.entries.insert(slot.to_string(), config);
        Ok(())
    }

    async fn load(&self, slot: &str) -> Result<Option<ConfigDraft>, StoreError> {
        Ok(self.entries.get(slot).map(|e| e.value().clone()))
    }
}

/// Store backed by the platform backend's configuration API.
pub struct HttpStore {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpStore {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            token,
        }
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

#[async_trait]
impl ConfigStore for HttpStore {
    async fn save(&self, slot: &str, config: ConfigDraft) -> Result<(), StoreError> {
        let url = format!("{}/slots/{}/config", self.base_url, slot);
        let response = self
            .request(self.client.put(&url).json(&config))
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(StoreError::Rejected(format!("status {status}: {body}")))
        }
    }

    async fn load(&self, slot: &str) -> Result<Option<ConfigDraft>, StoreError> {
        let url = format!("{}/slots/{}/config", self.base_url, slot);
        let response = self
            .request(self.client.get(&url))
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Unavailable(format!("status {status}")));
        }
        response
            .json()
            .await
            .map(Some)
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}
