//! Observability subsystem.
//!
//! # Design Decisions
//! - Structured logging via `tracing`, initialized in `main`
//! - Metrics are cheap (atomic counters behind the `metrics` facade)
//! - Prometheus exposition on a dedicated listener

pub mod metrics;
