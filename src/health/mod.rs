//! Health snapshot subsystem.
//!
//! # Data Flow
//! ```text
//! BreakerRegistry (circuit state, counters, last error)
//!     + SlotTable (which slot is the backup)
//!     → aggregator.rs
//!     → HealthSnapshot (read-only, recomputed on every request)
//! ```
//!
//! # Design Decisions
//! - The aggregator reads breaker state; it never mutates counters
//! - Snapshots are derived fresh on each call, never cached
//! - Failover is advisory: the snapshot flags it, callers route traffic

pub mod aggregator;

pub use aggregator::{HealthAggregator, HealthSnapshot};
