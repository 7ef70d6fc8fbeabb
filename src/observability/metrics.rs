//! Metrics collection and exposition.
//!
//! # Metrics
//! - `audit_lines_total` (counter): lines accepted by the sink, by level
//! - `audit_sink_failures_total` (counter): lines the sink rejected
//! - `audit_requests_total` (counter): watched requests by method, status
//! - `audit_request_duration_seconds` (histogram): latency by method
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Prometheus exporter only when enabled in config

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(
            address = %addr,
            error = %e,
            "Failed to install metrics exporter"
        ),
    }
}

pub fn record_audit_line(level: &'static str) {
    counter!("audit_lines_total", "level" => level).increment(1);
}

pub fn record_sink_failure() {
    counter!("audit_sink_failures_total").increment(1);
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "audit_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("audit_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}
