//! Prometheus metrics for gate decisions and the messaging API.
//!
//! Metrics are exposed via a dedicated HTTP endpoint (default port: 9090).
//!
//! # Available Metrics
//!
//! ## Counters
//! - `chatgate_requests_allowed_total` - Requests that passed every gate
//! - `chatgate_requests_rejected_total` - Requests rejected by a gate
//!   (label: reason)
//! - `chatgate_messages_stored_total` - Messages accepted into the store
//!
//! ## Gauges
//! - `chatgate_tracked_clients` - Client identities currently held by the
//!   rate limiter (updated by the background sweep)

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{error, info};

/// Metric names as constants for consistency.
pub mod names {
    pub const REQUESTS_ALLOWED_TOTAL: &str = "chatgate_requests_allowed_total";
    pub const REQUESTS_REJECTED_TOTAL: &str = "chatgate_requests_rejected_total";
    pub const MESSAGES_STORED_TOTAL: &str = "chatgate_messages_stored_total";
    pub const TRACKED_CLIENTS: &str = "chatgate_tracked_clients";
}

/// Initialize the Prometheus metrics exporter.
///
/// # Errors
///
/// Returns an error message if the exporter cannot be installed.
pub fn init_metrics(metrics_addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        names::REQUESTS_ALLOWED_TOTAL,
        "Total requests that passed every policy gate"
    );
    describe_counter!(
        names::REQUESTS_REJECTED_TOTAL,
        "Total requests rejected by a policy gate, by reason"
    );
    describe_counter!(
        names::MESSAGES_STORED_TOTAL,
        "Total messages accepted into the conversation store"
    );
    describe_gauge!(
        names::TRACKED_CLIENTS,
        "Client identities currently tracked by the rate limiter"
    );

    info!(addr = %metrics_addr, "Prometheus metrics endpoint started");
    Ok(())
}

/// Try to initialize metrics, logging any errors but not failing.
///
/// This is useful for cases where metrics are optional.
pub fn try_init_metrics(metrics_addr: SocketAddr) {
    if let Err(e) = init_metrics(metrics_addr) {
        error!(error = %e, "Failed to initialize metrics, continuing without metrics");
    }
}

/// Record a request that passed every gate.
pub fn record_request_allowed() {
    counter!(names::REQUESTS_ALLOWED_TOTAL).increment(1);
}

/// Record a gate rejection.
pub fn record_request_rejected(reason: &'static str) {
    counter!(names::REQUESTS_REJECTED_TOTAL, "reason" => reason).increment(1);
}

/// Record a message accepted into the store.
pub fn record_message_stored() {
    counter!(names::MESSAGES_STORED_TOTAL).increment(1);
}

/// Update the tracked-clients gauge.
pub fn set_tracked_clients(count: usize) {
    gauge!(names::TRACKED_CLIENTS).set(count as f64);
}
