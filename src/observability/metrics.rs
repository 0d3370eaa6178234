//! Metrics collection and exposition.
//!
//! # Metrics
//! - `custodian_deposits_confirmed_total` (counter): confirmed deposits by chain
//! - `custodian_withdrawals_sent_total` (counter): dispatched withdrawals by chain
//! - `custodian_withdrawals_deferred_total` (counter): items left Pending, by chain and reason
//! - `custodian_withdrawal_update_failures_total` (counter): post-send record
//!   update failures; anything non-zero needs manual reconciliation
//! - `custodian_scan_lag_blocks` (gauge): blocks between cursor and head per chain

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::model::Chain;

/// Install the Prometheus exporter on the given address.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(error = %e, "Failed to start metrics endpoint"),
    }
}

pub fn record_deposit_confirmed(chain: &Chain) {
    counter!("custodian_deposits_confirmed_total", "chain" => chain.to_string()).increment(1);
}

pub fn record_withdrawal_sent(chain: &Chain) {
    counter!("custodian_withdrawals_sent_total", "chain" => chain.to_string()).increment(1);
}

pub fn record_withdrawal_deferred(chain: &Chain, reason: &'static str) {
    counter!(
        "custodian_withdrawals_deferred_total",
        "chain" => chain.to_string(),
        "reason" => reason
    )
    .increment(1);
}

pub fn record_withdrawal_update_failure(chain: &Chain) {
    counter!("custodian_withdrawal_update_failures_total", "chain" => chain.to_string())
        .increment(1);
}

pub fn record_scan_lag(chain: &Chain, lag_blocks: u64) {
    gauge!("custodian_scan_lag_blocks", "chain" => chain.to_string()).set(lag_blocks as f64);
}
