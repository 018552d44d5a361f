//! Health snapshot assembly and failover decisions.

use std::sync::Arc;

use serde::Serialize;

use crate::breaker::{BreakerError, BreakerRegistry};
use crate::config::SlotTable;

/// Point-in-time health view of one provider slot.
#[derive(Debug, Clone, Serialize)]
pub struct HealthSnapshot {
    pub slot: String,
    pub provider_type: String,

    /// True iff the circuit is CLOSED.
    pub is_healthy: bool,

    /// "CLOSED" | "OPEN" | "HALF_OPEN".
    pub circuit_breaker_state: String,

    pub consecutive_failures: u32,
    pub error_count: u64,
    pub last_error: Option<String>,

    /// Unix milliseconds of the most recent call outcome.
    pub last_tested: Option<u64>,

    /// Unix milliseconds of the most recent CLOSED → OPEN transition;
    /// present while the circuit is OPEN or HALF_OPEN.
    pub opened_at: Option<u64>,

    /// Configured backup slot, if any.
    pub backup_provider: Option<String>,

    /// True when this slot is not CLOSED but its backup is: callers
    /// should route new traffic to the backup.
    pub failover_active: bool,
}

/// Combines circuit breaker state with slot configuration.
pub struct HealthAggregator {
    breakers: Arc<BreakerRegistry>,
    slots: Arc<SlotTable>,
}

impl HealthAggregator {
    pub fn new(breakers: Arc<BreakerRegistry>, slots: Arc<SlotTable>) -> Self {
        Self { breakers, slots }
    }

    /// Compute a fresh snapshot for one slot. Never served from a cache:
    /// a snapshot request is also what drives the lazy cooldown transition.
    pub async fn snapshot(&self, slot: &str) -> Result<HealthSnapshot, BreakerError> {
        let slot_config = self
            .slots
            .get(slot)
            .ok_or_else(|| BreakerError::UnknownSlot(slot.to_string()))?;

        let summary = self
            .breakers
            .summary(slot)
            .await
            .ok_or_else(|| BreakerError::UnknownSlot(slot.to_string()))?;

        let backup = slot_config.backup.clone();
        let failover_active = if summary.is_closed {
            false
        } else {
            match &backup {
                Some(backup_slot) => self.breakers.is_closed(backup_slot).await,
                None => false,
            }
        };

        Ok(HealthSnapshot {
            slot: slot.to_string(),
            provider_type: slot_config.provider_type.clone(),
            is_healthy: summary.is_closed,
            circuit_breaker_state: summary.state.to_string(),
            consecutive_failures: summary.consecutive_failures,
            error_count: summary.error_count,
            last_error: summary.last_error,
            last_tested: summary.last_tested_ms,
            opened_at: summary.opened_at_ms,
            backup_provider: backup,
            failover_active,
        })
    }

    /// Snapshots for every configured slot, in declaration order.
    pub async fn snapshot_all(&self) -> Vec<HealthSnapshot> {
        let mut snapshots = Vec::with_capacity(self.slots.len());
        for slot in self.slots.iter() {
            if let Ok(snapshot) = self.snapshot(&slot.name).await {
                snapshots.push(snapshot);
            }
        }
        snapshots
    }

    /// The slot live traffic should use right now: the slot itself while
    /// CLOSED, its backup while failover is active.
    pub async fn route_target(&self, slot: &str) -> Result<String, BreakerError> {
        let snapshot = self.snapshot(slot).await?;
        match (snapshot.failover_active, snapshot.backup_provider) {
            (true, Some(backup)) => Ok(backup),
            _ => Ok(snapshot.slot),
        }
    }
}
