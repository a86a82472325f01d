//! Metrics collection and exposition.
//!
//! # Metrics
//! - `keygate_auth_outcomes_total` (counter): resolutions by outcome
//! - `keygate_rate_limited_total` (counter): requests rejected by the throttle
//! - `keygate_attempts_recorded_total` (counter): ledger appends by result
//! - `keygate_credentials_issued_total` (counter): keys handed out
//! - `keygate_ledger_addresses` (gauge): addresses with live history
//!
//! Recording is a no-op until a recorder is installed, so tests and
//! embedders that skip [`init_metrics`] pay nothing.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_auth_outcome(outcome: &'static str) {
    metrics::counter!("keygate_auth_outcomes_total", "outcome" => outcome).increment(1);
}

pub fn record_rate_limited() {
    metrics::counter!("keygate_rate_limited_total").increment(1);
}

pub fn record_attempt(succeeded: bool) {
    let result = if succeeded { "success" } else { "failure" };
    metrics::counter!("keygate_attempts_recorded_total", "result" => result).increment(1);
}

pub fn record_credential_issued() {
    metrics::counter!("keygate_credentials_issued_total").increment(1);
}

pub fn record_ledger_size(addresses: usize) {
    metrics::gauge!("keygate_ledger_addresses").set(addresses as f64);
}
