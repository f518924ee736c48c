//! Metrics collection and exposition.
//!
//! # Metrics
//! - `orchestrator_transfers_created_total` (counter): broadcast transfers by asset
//! - `orchestrator_transfer_status_total` (counter): status transitions by status
//! - `orchestrator_validations_total` (counter): validation outcomes by outcome
//! - `orchestrator_nonces_issued_total` (counter): nonces handed out
//! - `orchestrator_watch_timeouts_total` (counter): watchers that gave up waiting
//! - `orchestrator_rpc_failures_total` (counter): exhausted RPC calls by operation
//! - `orchestrator_managed_addresses` (gauge): addresses held by the store

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_transfer_created(asset: &str) {
    counter!("orchestrator_transfers_created_total", "asset" => asset.to_string()).increment(1);
}

pub fn record_transfer_status(status: &'static str) {
    counter!("orchestrator_transfer_status_total", "status" => status).increment(1);
}

pub fn record_validation(outcome: &'static str) {
    counter!("orchestrator_validations_total", "outcome" => outcome).increment(1);
}

pub fn record_nonce_issued() {
    counter!("orchestrator_nonces_issued_total").increment(1);
}

pub fn record_watch_timeout() {
    counter!("orchestrator_watch_timeouts_total").increment(1);
}

pub fn record_rpc_failure(operation: &'static str) {
    counter!("orchestrator_rpc_failures_total", "operation" => operation).increment(1);
}

pub fn record_managed_addresses(count: usize) {
    gauge!("orchestrator_managed_addresses").set(count as f64);
}
