//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): dispatched calls by operation, status
//! - `gateway_request_duration_seconds` (histogram): latency by operation
//!
//! Recording is always on; without an installed exporter the `metrics`
//! facade drops the values.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one dispatched call.
pub fn record_request(operation: &'static str, status: u16, start: Instant) {
    ::metrics::counter!(
        "gateway_requests_total",
        "operation" => operation,
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("gateway_request_duration_seconds", "operation" => operation)
        .record(start.elapsed().as_secs_f64());
}
