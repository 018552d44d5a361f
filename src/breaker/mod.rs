//! Circuit breaker subsystem.
//!
//! # State Transitions
//! ```text
//! CLOSED → OPEN: consecutive failures >= failure_threshold
//! OPEN → HALF_OPEN: cooldown elapsed (evaluated lazily), or manual test
//! HALF_OPEN → CLOSED: the single allowed probe succeeds
//! HALF_OPEN → OPEN: the probe fails (opened_at resets)
//! ```
//!
//! # Design Decisions
//! - Per-slot circuit, one shared policy
//! - OPEN fails fast: rejected calls are never attempted
//! - Cooldown is checked on the next call attempt or snapshot request,
//!   not by a background timer
//! - Exactly one probe in HALF_OPEN; a manual test while OPEN becomes
//!   that probe without waiting out the cooldown

pub mod circuit;

pub use circuit::{
    BreakerError, BreakerPolicy, BreakerRegistry, CircuitState, CircuitSummary, SlotId,
};
