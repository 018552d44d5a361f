use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize, Deserialize)]
pub struct SchemaResponse {
    pub provider_type: String,
    pub fields: Vec<Value>,
    pub form: Vec<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TestResult {
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub slot: String,
    pub provider_type: String,
    pub is_healthy: bool,
    pub circuit_breaker_state: String,
    pub consecutive_failures: u32,
    pub error_count: u64,
    pub last_error: Option<String>,
    pub last_tested: Option<u64>,
    pub opened_at: Option<u64>,
    pub backup_provider: Option<String>,
    pub failover_active: bool,
}

/// Typed client for the provider-gate HTTP API.
pub struct GateClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GateClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Fetch the field schema for a provider type.
    pub async fn schema(&self, provider_type: &str) -> Result<SchemaResponse, Box<dyn std::error::Error>> {
        let resp = self
            .client
            .get(format!("{}/api/schemas/{}", self.base_url, provider_type))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        Self::parse(resp).await
    }

    /// Test a draft configuration against the provider without persisting it.
    pub async fn test_draft(&self, slot: &str, draft: &Value) -> Result<TestResult, Box<dyn std::error::Error>> {
        let resp = self
            .client
            .post(format!("{}/api/slots/{}/test", self.base_url, slot))
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "draft": draft }))
            .send()
            .await?;
        Self::parse(resp).await
    }

    /// Test the slot's active configuration. While the circuit is open
    /// this doubles as the recovery probe.
    pub async fn test_active(&self, slot: &str) -> Result<TestResult, Box<dyn std::error::Error>> {
        let resp = self
            .client
            .post(format!("{}/api/slots/{}/test", self.base_url, slot))
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({}))
            .send()
            .await?;
        Self::parse(resp).await
    }

    /// Validate and activate a configuration for a slot.
    pub async fn save(&self, slot: &str, draft: &Value) -> Result<Value, Box<dyn std::error::Error>> {
        let resp = self
            .client
            .post(format!("{}/api/slots/{}/config", self.base_url, slot))
            .bearer_auth(&self.api_key)
            .json(draft)
            .send()
            .await?;
        Self::parse(resp).await
    }

    /// Health snapshot for one slot.
    pub async fn health(&self, slot: &str) -> Result<HealthSnapshot, Box<dyn std::error::Error>> {
        let resp = self
            .client
            .get(format!("{}/api/slots/{}/health", self.base_url, slot))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        Self::parse(resp).await
    }

    /// Health snapshots for every slot.
    pub async fn health_all(&self) -> Result<Vec<HealthSnapshot>, Box<dyn std::error::Error>> {
        let resp = self
            .client
            .get(format!("{}/api/slots", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        Self::parse(resp).await
    }

    async fn parse<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> Result<T, Box<dyn std::error::Error>> {
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(format!("API returned status {}: {}", status, text).into());
        }

        Ok(serde_json::from_str::<T>(&text)?)
    }
}
