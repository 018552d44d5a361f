//! The test/activate workflow for provider configurations.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::info;

use crate::breaker::{BreakerError, BreakerRegistry};
use crate::config::schema::SlotConfig;
use crate::config::SlotTable;
use crate::form::{self, ConfigDraft, ValidationError};
use crate::observability::metrics;
use crate::schema::SchemaCatalog;
use crate::workflow::probe::ProviderProbe;
use crate::workflow::store::{ConfigStore, StoreError};

/// What a slot's workflow is doing right now. Testing and saving are
/// mutually exclusive by construction: a slot holds at most one phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Testing,
    Saving,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Idle => "idle",
            Phase::Testing => "testing",
            Phase::Saving => "saving",
        })
    }
}

/// Workflow failure modes. None of these are fatal; every variant maps to
/// a caller-visible, recoverable condition.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("validation failed for {} field(s)", .0.len())]
    Validation(Vec<ValidationError>),

    #[error("persistence failed: {0}")]
    Persistence(#[from] StoreError),

    #[error(transparent)]
    Breaker(#[from] BreakerError),

    #[error("unknown slot: {0}")]
    UnknownSlot(String),

    #[error("slot {slot} is busy ({phase})")]
    Busy { slot: String, phase: Phase },

    #[error("slot {0} has no active configuration to test")]
    NoActiveConfig(String),
}

/// Outcome of a connectivity test, as reported to the caller.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TestReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TestReport {
    fn passed() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            success: false,
            error: Some(error),
        }
    }
}

/// Drives testing and activation of provider configurations.
pub struct ActivationWorkflow {
    probe: Arc<dyn ProviderProbe>,
    store: Arc<dyn ConfigStore>,
    catalog: Arc<SchemaCatalog>,
    breakers: Arc<BreakerRegistry>,
    slots: Arc<SlotTable>,
    phases: Arc<DashMap<String, Phase>>,
}

impl ActivationWorkflow {
    pub fn new(
        probe: Arc<dyn ProviderProbe>,
        store: Arc<dyn ConfigStore>,
        catalog: Arc<SchemaCatalog>,
        breakers: Arc<BreakerRegistry>,
        slots: Arc<SlotTable>,
    ) -> Self {
        Self {
            probe,
            store,
            catalog,
            breakers,
            slots,
            phases: Arc::new(DashMap::new()),
        }
    }

    /// The phase a slot's workflow is currently in.
    pub fn phase(&self, slot: &str) -> Phase {
        self.phases.get(slot).map(|p| *p).unwrap_or(Phase::Idle)
    }

    /// Test connectivity for a slot.
    ///
    /// With a draft: a pre-activation credential check. The draft is probed
    /// as-is; neither the persisted configuration nor the circuit breaker
    /// is touched.
    ///
    /// Without a draft: a manual connection test of the active
    /// configuration. Counts as a genuine call outcome, and while the
    /// circuit is OPEN it is admitted as the recovery probe immediately,
    /// cooldown or not.
    pub async fn test(
        &self,
        slot: &str,
        draft: Option<ConfigDraft>,
    ) -> Result<TestReport, WorkflowError> {
        let slot_config = self.slot_config(slot)?;
        let _guard = self.try_begin(slot, Phase::Testing)?;

        match draft {
            Some(draft) => {
                let report = self.run_probe(&slot_config, &draft).await;
                metrics::record_probe(slot, report.success);
                Ok(report)
            }
            None => {
                let active = self
                    .store
                    .load(slot)
                    .await?
                    .ok_or_else(|| WorkflowError::NoActiveConfig(slot.to_string()))?;

                self.breakers.begin_manual_probe(slot).await?;
                let report = self.run_probe(&slot_config, &active).await;
                metrics::record_probe(slot, report.success);
                match &report.error {
                    None => self.breakers.record_success(slot).await?,
                    Some(error) => self.breakers.record_failure(slot, error.clone()).await?,
                }
                Ok(report)
            }
        }
    }

    /// Validate, persist, and activate a draft for a slot.
    ///
    /// Activation reinitializes the slot's circuit to CLOSED with zeroed
    /// counters. On any failure the previously active configuration is
    /// untouched and the caller keeps the draft for retry.
    pub async fn save(&self, slot: &str, draft: ConfigDraft) -> Result<ConfigDraft, WorkflowError> {
        let slot_config = self.slot_config(slot)?;
        let _guard = self.try_begin(slot, Phase::Saving)?;

        let schema = self.catalog.get(&slot_config.provider_type);
        let validated = form::validate(schema, &draft).map_err(WorkflowError::Validation)?;

        self.store.save(slot, validated.clone()).await?;
        self.breakers.reset(slot).await;
        info!(slot = %slot, provider_type = %slot_config.provider_type, "Configuration activated");

        Ok(validated)
    }

    /// The active configuration for a slot, for schema-driven re-rendering.
    pub async fn active_config(&self, slot: &str) -> Result<Option<ConfigDraft>, WorkflowError> {
        self.slot_config(slot)?;
        Ok(self.store.load(slot).await?)
    }

    async fn run_probe(&self, slot: &SlotConfig, config: &ConfigDraft) -> TestReport {
        match self.probe.probe(slot, config).await {
            Ok(()) => TestReport::passed(),
            Err(e) => TestReport::failed(e.to_string()),
        }
    }

    fn slot_config(&self, slot: &str) -> Result<SlotConfig, WorkflowError> {
        self.slots
            .get(slot)
            .cloned()
            .ok_or_else(|| WorkflowError::UnknownSlot(slot.to_string()))
    }

    fn try_begin(&self, slot: &str, phase: Phase) -> Result<PhaseGuard, WorkflowError> {
        use dashmap::mapref::entry::Entry;
        match self.phases.entry(slot.to_string()) {
            Entry::Occupied(existing) => Err(WorkflowError::Busy {
                slot: slot.to_string(),
                phase: *existing.get(),
            }),
            Entry::Vacant(vacant) => {
                vacant.insert(phase);
                Ok(PhaseGuard {
                    phases: self.phases.clone(),
                    slot: slot.to_string(),
                })
            }
        }
    }
}

/// Returns the slot to Idle when the operation finishes, succeed or fail.
struct PhaseGuard {
    phases: Arc<DashMap<String, Phase>>,
    slot: String,
}

impl Drop for PhaseGuard {
    fn drop(&mut self) {
        self.phases.remove(&self.slot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breaker::BreakerPolicy;
    use crate::config::schema::SlotConfig;
    use crate::workflow::probe::ProbeError;
    use crate::workflow::store::MemoryStore;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    struct ScriptedProbe {
        fail: AtomicBool,
    }

    impl ScriptedProbe {
        fn passing() -> Self {
            Self {
                fail: AtomicBool::new(false),
            }
        }

        fn set_failing(&self, failing: bool) {
            self.fail.store(failing, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl ProviderProbe for ScriptedProbe {
        async fn probe(&self, _: &SlotConfig, _: &ConfigDraft) -> Result<(), ProbeError> {
            if self.fail.load(Ordering::SeqCst) {
                Err(ProbeError::Rejected(401))
            } else {
                Ok(())
            }
        }
    }

    struct RejectingStore;

    #[async_trait]
    impl ConfigStore for RejectingStore {
        async fn save(&self, _: &str, _: ConfigDraft) -> Result<(), StoreError> {
            Err(StoreError::Rejected("conflicting slot revision".into()))
        }

        async fn load(&self, _: &str) -> Result<Option<ConfigDraft>, StoreError> {
            Ok(None)
        }
    }

    fn good_draft() -> ConfigDraft {
        ConfigDraft::from([
            ("api_key".to_string(), json!("sk-123")),
            ("voice_id".to_string(), json!("aria")),
        ])
    }

    async fn setup(
        probe: Arc<dyn ProviderProbe>,
        store: Arc<dyn ConfigStore>,
    ) -> (ActivationWorkflow, Arc<BreakerRegistry>) {
        let slots = vec![SlotConfig {
            name: "voice".to_string(),
            provider_type: "voice-gateway".to_string(),
            probe_url: "http://127.0.0.1:9001/health".to_string(),
            backup: None,
        }];
        let breakers = Arc::new(BreakerRegistry::new(BreakerPolicy {
            failure_threshold: 2,
            cooldown: Duration::from_secs(300),
        }));
        breakers.register("voice").await;
        let workflow = ActivationWorkflow::new(
            probe,
            store,
            Arc::new(SchemaCatalog::builtin()),
            breakers.clone(),
            Arc::new(SlotTable::from_config(&slots)),
        );
        (workflow, breakers)
    }

    #[tokio::test]
    async fn draft_test_touches_neither_store_nor_breaker() {
        let probe = Arc::new(ScriptedProbe::passing());
        probe.set_failing(true);
        let store = Arc::new(MemoryStore::new());
        let (workflow, breakers) = setup(probe, store.clone()).await;

        let report = workflow.test("voice", Some(good_draft())).await.unwrap();
        assert!(!report.success);
        assert!(report.error.is_some());

        assert!(store.load("voice").await.unwrap().is_none());
        let s = breakers.summary("voice").await.unwrap();
        assert_eq!(s.error_count, 0);
        assert!(s.last_tested_ms.is_none());
    }

    #[tokio::test]
    async fn save_persists_and_resets_breaker() {
        let probe = Arc::new(ScriptedProbe::passing());
        let store = Arc::new(MemoryStore::new());
        let (workflow, breakers) = setup(probe, store.clone()).await;

        breakers.record_failure("voice", "down".into()).await.unwrap();
        breakers.record_failure("voice", "down".into()).await.unwrap();
        assert_eq!(breakers.summary("voice").await.unwrap().state, "OPEN");

        let saved = workflow.save("voice", good_draft()).await.unwrap();
        assert_eq!(saved.get("api_key"), Some(&json!("sk-123")));

        let s = breakers.summary("voice").await.unwrap();
        assert_eq!(s.state, "CLOSED");
        assert_eq!(s.consecutive_failures, 0);
        assert_eq!(store.load("voice").await.unwrap(), Some(saved));
    }

    #[tokio::test]
    async fn invalid_draft_is_rejected_without_persisting() {
        let probe = Arc::new(ScriptedProbe::passing());
        let store = Arc::new(MemoryStore::new());
        let (workflow, _) = setup(probe, store.clone()).await;

        let draft = ConfigDraft::from([("voice_id".to_string(), json!("aria"))]);
        match workflow.save("voice", draft).await {
            Err(WorkflowError::Validation(errors)) => {
                assert!(errors.iter().any(|e| e.field == "api_key"));
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
        assert!(store.load("voice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rejected_save_leaves_breaker_untouched() {
        let probe = Arc::new(ScriptedProbe::passing());
        let (workflow, breakers) = setup(probe, Arc::new(RejectingStore)).await;

        breakers.record_failure("voice", "down".into()).await.unwrap();
        let before = breakers.summary("voice").await.unwrap();

        match workflow.save("voice", good_draft()).await {
            Err(WorkflowError::Persistence(StoreError::Rejected(_))) => {}
            other => panic!("expected persistence rejection, got {other:?}"),
        }

        let after = breakers.summary("voice").await.unwrap();
        assert_eq!(after.consecutive_failures, before.consecutive_failures);
        assert_eq!(after.error_count, before.error_count);
    }

    #[tokio::test]
    async fn active_config_test_drives_the_breaker() {
        let probe = Arc::new(ScriptedProbe::passing());
        let store = Arc::new(MemoryStore::new());
        let (workflow, breakers) = setup(probe.clone(), store).await;

        workflow.save("voice", good_draft()).await.unwrap();

        probe.set_failing(true);
        let report = workflow.test("voice", None).await.unwrap();
        assert!(!report.success);
        let s = breakers.summary("voice").await.unwrap();
        assert_eq!(s.error_count, 1);
        assert!(s.last_error.is_some());

        probe.set_failing(false);
        let report = workflow.test("voice", None).await.unwrap();
        assert!(report.success);
        assert_eq!(breakers.summary("voice").await.unwrap().consecutive_failures, 0);
    }

    #[tokio::test]
    async fn manual_test_recovers_an_open_circuit() {
        let probe = Arc::new(ScriptedProbe::passing());
        let store = Arc::new(MemoryStore::new());
        let (workflow, breakers) = setup(probe.clone(), store).await;

        workflow.save("voice", good_draft()).await.unwrap();
        breakers.record_failure("voice", "down".into()).await.unwrap();
        breakers.record_failure("voice", "down".into()).await.unwrap();
        assert_eq!(breakers.summary("voice").await.unwrap().state, "OPEN");

        // Cooldown is 300s, but the operator's test is the recovery probe.
        let report = workflow.test("voice", None).await.unwrap();
        assert!(report.success);
        assert_eq!(breakers.summary("voice").await.unwrap().state, "CLOSED");
    }

    #[tokio::test]
    async fn test_without_active_config_is_an_error() {
        let probe = Arc::new(ScriptedProbe::passing());
        let store = Arc::new(MemoryStore::new());
        let (workflow, _) = setup(probe, store).await;

        assert!(matches!(
            workflow.test("voice", None).await,
            Err(WorkflowError::NoActiveConfig(_))
        ));
    }

    #[tokio::test]
    async fn busy_slot_rejects_concurrent_operations() {
        let probe = Arc::new(ScriptedProbe::passing());
        let store = Arc::new(MemoryStore::new());
        let (workflow, _) = setup(probe, store).await;

        let _guard = workflow.try_begin("voice", Phase::Testing).unwrap();
        assert_eq!(workflow.phase("voice"), Phase::Testing);

        match workflow.save("voice", good_draft()).await {
            Err(WorkflowError::Busy { phase, .. }) => assert_eq!(phase, Phase::Testing),
            other => panic!("expected busy, got {other:?}"),
        }
        match workflow.test("voice", Some(good_draft())).await {
            Err(WorkflowError::Busy { .. }) => {}
            other => panic!("expected busy, got {other:?}"),
        }

        drop(_guard);
        assert_eq!(workflow.phase("voice"), Phase::Idle);
        assert!(workflow.save("voice", good_draft()).await.is_ok());
    }

    #[tokio::test]
    async fn unknown_slot_is_rejected_before_any_work() {
        let probe = Arc::new(ScriptedProbe::passing());
        let store = Arc::new(MemoryStore::new());
        let (workflow, _) = setup(probe, store).await;

        assert!(matches!(
            workflow.test("fax", Some(good_draft())).await,
            Err(WorkflowError::UnknownSlot(_))
        ));
        assert!(matches!(
            workflow.save("fax", good_draft()).await,
            Err(WorkflowError::UnknownSlot(_))
        ));
    }
}
