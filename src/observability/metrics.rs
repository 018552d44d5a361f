//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gate_probes_total` (counter): connectivity probes by slot, outcome
//! - `gate_breaker_transitions_total` (counter): state changes by slot, to-state
//! - `gate_breaker_rejections_total` (counter): fail-fast rejections by slot
//! - `gate_slot_health` (gauge): 1 = CLOSED, 0 = not

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus exposition endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(error = %e, "Failed to start metrics endpoint"),
    }
}

pub fn record_probe(slot: &str, success: bool) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!(
        "gate_probes_total",
        "slot" => slot.to_string(),
        "outcome" => outcome,
    )
    .increment(1);
}

pub fn record_breaker_transition(slot: &str, to: &'static str) {
    metrics::counter!(
        "gate_breaker_transitions_total",
        "slot" => slot.to_string(),
        "to" => to,
    )
    .increment(1);
}

pub fn record_breaker_rejection(slot: &str) {
    metrics::counter!("gate_breaker_rejections_total", "slot" => slot.to_string()).increment(1);
}

pub fn set_slot_health(slot: &str, healthy: bool) {
    metrics::gauge!("gate_slot_health", "slot" => slot.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
}
