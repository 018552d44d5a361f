//! Per-slot circuit breaker state machine and registry.

use std::collections::HashMap;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::schema::BreakerConfig;
use crate::observability::metrics;

/// Identifier of a provider slot.
pub type SlotId = String;

/// Circuit breaker error types.
#[derive(Debug, thiserror::Error)]
pub enum BreakerError {
    /// The circuit is OPEN and the cooldown has not elapsed; the call was
    /// rejected without being attempted. Expected behavior, not a bug.
    #[error("circuit open for slot {slot}, retry in {retry_in:?}")]
    Rejected { slot: SlotId, retry_in: Duration },

    /// HALF_OPEN admits exactly one probe; one is already in flight.
    #[error("recovery probe already in flight for slot {0}")]
    ProbeInFlight(SlotId),

    #[error("unknown slot: {0}")]
    UnknownSlot(SlotId),
}

/// Breaker policy constants.
#[derive(Debug, Clone, Copy)]
pub struct BreakerPolicy {
    /// Consecutive failures before a CLOSED circuit opens.
    pub failure_threshold: u32,

    /// How long an OPEN circuit waits before admitting a recovery probe.
    pub cooldown: Duration,
}

impl Default for BreakerPolicy {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown: Duration::from_secs(60),
        }
    }
}

impl From<BreakerConfig> for BreakerPolicy {
    fn from(config: BreakerConfig) -> Self {
        Self {
            failure_threshold: config.failure_threshold,
            cooldown: Duration::from_secs(config.cooldown_secs),
        }
    }
}

/// Circuit breaker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation; calls pass through.
    Closed,

    /// Provider assumed down; calls fail fast until the cooldown elapses.
    Open {
        /// When the circuit opened (monotonic, for cooldown math).
        opened_at: Instant,
    },

    /// Testing recovery; exactly one probe is admitted.
    HalfOpen {
        /// Carried over from OPEN; cleared only on recovery.
        opened_at: Instant,
        /// Set while the single probe is outstanding.
        probe_started: Option<Instant>,
    },
}

impl CircuitState {
    /// Wire name, matching what the dashboard renders.
    pub fn name(&self) -> &'static str {
        match self {
            CircuitState::Closed => "CLOSED",
            CircuitState::Open { .. } => "OPEN",
            CircuitState::HalfOpen { .. } => "HALF_OPEN",
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, CircuitState::Closed)
    }
}

/// Breaker state for one provider slot.
#[derive(Debug)]
struct ProviderCircuit {
    state: CircuitState,
    policy: BreakerPolicy,
    consecutive_failures: u32,
    /// Lifetime failure counter, never reset.
    error_count: u64,
    last_error: Option<String>,
    last_tested: Option<SystemTime>,
    /// Wall-clock twin of the monotonic opened_at, for display.
    opened_wall: Option<SystemTime>,
}

impl ProviderCircuit {
    fn new(policy: BreakerPolicy) -> Self {
        Self {
            state: CircuitState::Closed,
            policy,
            consecutive_failures: 0,
            error_count: 0,
            last_error: None,
            last_tested: None,
            opened_wall: None,
        }
    }

    /// Apply time-driven transitions. Called lazily from every entry point
    /// so OPEN → HALF_OPEN needs no background timer.
    fn poll(&mut self, now: Instant) {
        match self.state {
            CircuitState::Open { opened_at } => {
                if now.duration_since(opened_at) >= self.policy.cooldown {
                    self.state = CircuitState::HalfOpen {
                        opened_at,
                        probe_started: None,
                    };
                }
            }
            CircuitState::HalfOpen {
                opened_at,
                probe_started: Some(started),
            } => {
                // A probe whose outcome was never reported (caller went
                // away mid-flight) releases its slot after one cooldown.
                if now.duration_since(started) >= self.policy.cooldown {
                    self.state = CircuitState::HalfOpen {
                        opened_at,
                        probe_started: None,
                    };
                }
            }
            _ => {}
        }
    }

    /// Admission check for a call attempt (live traffic or probe alike).
    fn admit(&mut self, slot: &str, now: Instant) -> Result<(), BreakerError> {
        self.poll(now);
        match self.state {
            CircuitState::Closed => Ok(()),
            CircuitState::Open { opened_at } => {
                let elapsed = now.duration_since(opened_at);
                Err(BreakerError::Rejected {
                    slot: slot.to_string(),
                    retry_in: self.policy.cooldown.saturating_sub(elapsed),
                })
            }
            CircuitState::HalfOpen {
                opened_at,
                probe_started: None,
            } => {
                self.state = CircuitState::HalfOpen {
                    opened_at,
                    probe_started: Some(now),
                };
                Ok(())
            }
            CircuitState::HalfOpen {
                probe_started: Some(_),
                ..
            } => Err(BreakerError::ProbeInFlight(slot.to_string())),
        }
    }

    /// Acquire the recovery probe for a manual connection test. While OPEN
    /// this forces HALF_OPEN immediately, cooldown or not; the operator
    /// asked for it.
    fn begin_manual_probe(&mut self, slot: &str, now: Instant) -> Result<(), BreakerError> {
        self.poll(now);
        match self.state {
            CircuitState::Closed => Ok(()),
            CircuitState::Open { opened_at } => {
                self.state = CircuitState::HalfOpen {
                    opened_at,
                    probe_started: Some(now),
                };
                Ok(())
            }
            CircuitState::HalfOpen {
                opened_at,
                probe_started: None,
            } => {
                self.state = CircuitState::HalfOpen {
                    opened_at,
                    probe_started: Some(now),
                };
                Ok(())
            }
            CircuitState::HalfOpen {
                probe_started: Some(_),
                ..
            } => Err(BreakerError::ProbeInFlight(slot.to_string())),
        }
    }

    fn record_success(&mut self, now: Instant) {
        self.poll(now);
        self.last_tested = Some(SystemTime::now());
        self.consecutive_failures = 0;

        match self.state {
            CircuitState::Closed => {
                debug!("Call succeeded in CLOSED state");
            }
            CircuitState::Open { .. } => {
                // Outcome of a call admitted before the circuit opened.
                warn!("Success reported while OPEN; state unchanged");
            }
            CircuitState::HalfOpen { .. } => {
                self.state = CircuitState::Closed;
                self.opened_wall = None;
            }
        }
    }

    fn record_failure(&mut self, error: String, now: Instant) {
        self.poll(now);
        self.last_tested = Some(SystemTime::now());
        self.last_error = Some(error);
        self.error_count += 1;
        self.consecutive_failures += 1;

        match self.state {
            CircuitState::Closed => {
                if self.consecutive_failures >= self.policy.failure_threshold {
                    self.state = CircuitState::Open { opened_at: now };
                    self.opened_wall = Some(SystemTime::now());
                }
            }
            CircuitState::Open { .. } => {
                debug!("Failure reported while OPEN");
            }
            CircuitState::HalfOpen { .. } => {
                // The probe failed; back to OPEN with a fresh cooldown.
                self.state = CircuitState::Open { opened_at: now };
                self.opened_wall = Some(SystemTime::now());
            }
        }
    }

    fn summary(&self) -> CircuitSummary {
        CircuitSummary {
            state: self.state.name(),
            is_closed: self.state.is_closed(),
            consecutive_failures: self.consecutive_failures,
            error_count: self.error_count,
            last_error: self.last_error.clone(),
            last_tested_ms: self.last_tested.map(unix_ms),
            opened_at_ms: self.opened_wall.map(unix_ms),
        }
    }
}

fn unix_ms(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Read-only view of one circuit, consumed by the health aggregator.
#[derive(Debug, Clone)]
pub struct CircuitSummary {
    pub state: &'static str,
    pub is_closed: bool,
    pub consecutive_failures: u32,
    pub error_count: u64,
    pub last_error: Option<String>,
    pub last_tested_ms: Option<u64>,
    pub opened_at_ms: Option<u64>,
}

/// Circuit breaker registry for all provider slots.
///
/// All state mutation goes through the write lock, serializing concurrent
/// outcome reports against the same slot.
pub struct BreakerRegistry {
    circuits: RwLock<HashMap<SlotId, ProviderCircuit>>,
    policy: BreakerPolicy,
}

impl BreakerRegistry {
    pub fn new(policy: BreakerPolicy) -> Self {
        Self {
            circuits: RwLock::new(HashMap::new()),
            policy,
        }
    }

    /// Registry pre-populated with a circuit per slot, all CLOSED.
    pub fn with_slots<'a>(policy: BreakerPolicy, slots: impl Iterator<Item = &'a str>) -> Self {
        let circuits = slots
            .map(|s| (s.to_string(), ProviderCircuit::new(policy)))
            .collect();
        Self {
            circuits: RwLock::new(circuits),
            policy,
        }
    }

    /// Start tracking a slot if it is not tracked yet. Circuits start
    /// CLOSED with zeroed counters.
    pub async fn register(&self, slot: &str) {
        let mut circuits = self.circuits.write().await;
        if !circuits.contains_key(slot) {
            info!(slot = %slot, "Registering slot with circuit breaker");
            circuits.insert(slot.to_string(), ProviderCircuit::new(self.policy));
        }
    }

    /// Reinitialize a slot's circuit to CLOSED with zeroed counters.
    /// Called when a new configuration is activated for the slot.
    pub async fn reset(&self, slot: &str) {
        let mut circuits = self.circuits.write().await;
        info!(slot = %slot, "Resetting circuit to CLOSED for new configuration");
        circuits.insert(slot.to_string(), ProviderCircuit::new(self.policy));
        metrics::set_slot_health(slot, true);
    }

    /// Admission check for a live call attempt.
    pub async fn admit(&self, slot: &str) -> Result<(), BreakerError> {
        let mut circuits = self.circuits.write().await;
        let circuit = circuits
            .get_mut(slot)
            .ok_or_else(|| BreakerError::UnknownSlot(slot.to_string()))?;

        let before = circuit.state.name();
        let result = circuit.admit(slot, Instant::now());
        log_transition(slot, before, circuit);
        if result.is_err() {
            metrics::record_breaker_rejection(slot);
        }
        result
    }

    /// Acquire the recovery probe for a manual connection test.
    pub async fn begin_manual_probe(&self, slot: &str) -> Result<(), BreakerError> {
        let mut circuits = self.circuits.write().await;
        let circuit = circuits
            .get_mut(slot)
            .ok_or_else(|| BreakerError::UnknownSlot(slot.to_string()))?;

        let before = circuit.state.name();
        let result = circuit.begin_manual_probe(slot, Instant::now());
        log_transition(slot, before, circuit);
        result
    }

    /// Report a successful call outcome for a slot.
    pub async fn record_success(&self, slot: &str) -> Result<(), BreakerError> {
        let mut circuits = self.circuits.write().await;
        let circuit = circuits
            .get_mut(slot)
            .ok_or_else(|| BreakerError::UnknownSlot(slot.to_string()))?;

        let before = circuit.state.name();
        circuit.record_success(Instant::now());
        log_transition(slot, before, circuit);
        Ok(())
    }

    /// Report a failed call outcome for a slot.
    pub async fn record_failure(&self, slot: &str, error: String) -> Result<(), BreakerError> {
        let mut circuits = self.circuits.write().await;
        let circuit = circuits
            .get_mut(slot)
            .ok_or_else(|| BreakerError::UnknownSlot(slot.to_string()))?;

        let before = circuit.state.name();
        circuit.record_failure(error, Instant::now());
        log_transition(slot, before, circuit);
        Ok(())
    }

    /// Current view of a slot's circuit. Takes the write lock so the
    /// lazy OPEN → HALF_OPEN transition is observable from snapshots too.
    pub async fn summary(&self, slot: &str) -> Option<CircuitSummary> {
        let mut circuits = self.circuits.write().await;
        let circuit = circuits.get_mut(slot)?;
        let before = circuit.state.name();
        circuit.poll(Instant::now());
        log_transition(slot, before, circuit);
        Some(circuit.summary())
    }

    /// Whether a slot's circuit is currently CLOSED.
    pub async fn is_closed(&self, slot: &str) -> bool {
        self.summary(slot).await.map(|s| s.is_closed).unwrap_or(false)
    }
}

fn log_transition(slot: &str, before: &'static str, circuit: &ProviderCircuit) {
    let after = circuit.state.name();
    if before != after {
        info!(slot = %slot, from = before, to = after, "Circuit transition");
        metrics::record_breaker_transition(slot, after);
        metrics::set_slot_health(slot, circuit.state.is_closed());
    }
}
