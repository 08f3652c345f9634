//! Metrics collection and exposition.
//!
//! # Metrics
//! - `edge_decisions_total` (counter): decisions by branch and kind
//! - `edge_session_decode_total` (counter): session decode outcomes
//! - `edge_upstream_duration_seconds` (histogram): forwarding latency by target
//! - `edge_upstream_errors_total` (counter): failed forwards by target and reason

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::routing::Routed;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_decision(routed: &Routed) {
    counter!(
        "edge_decisions_total",
        "branch" => routed.branch.as_str(),
        "kind" => routed.decision.kind()
    )
    .increment(1);
}

pub fn record_session_decode(outcome: &'static str) {
    counter!("edge_session_decode_total", "outcome" => outcome).increment(1);
}

pub fn record_upstream(target: &'static str, status: u16, start: Instant) {
    histogram!(
        "edge_upstream_duration_seconds",
        "target" => target,
        "status" => status.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_upstream_error(target: &'static str, reason: &'static str) {
    counter!("edge_upstream_errors_total", "target" => target, "reason" => reason).increment(1);
}
