//! Metrics collection and exposition.
//!
//! # Metrics
//! - `task_health_passes_total` (counter): passes by outcome
//! - `task_health_pass_duration_seconds` (histogram): pass latency
//! - `task_health_records_total` (counter): health records produced
//! - `task_health_evictions_total` (counter): eviction events by reason
//! - `task_health_query_failures_total` (counter): failed live queries

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

/// Start the Prometheus exporter on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished pass.
pub fn record_pass(outcome: &'static str, duration: Duration) {
    counter!("task_health_passes_total", "outcome" => outcome).increment(1);
    histogram!("task_health_pass_duration_seconds").record(duration.as_secs_f64());
}

pub fn record_health_records(count: usize) {
    counter!("task_health_records_total").increment(count as u64);
}

pub fn record_evictions(reason: &'static str, count: usize) {
    if count > 0 {
        counter!("task_health_evictions_total", "reason" => reason).increment(count as u64);
    }
}

pub fn record_query_failure() {
    counter!("task_health_query_failures_total").increment(1);
}
