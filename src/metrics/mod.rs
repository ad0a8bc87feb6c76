// metrics/mod.rs
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{debug, warn};

use crate::error::SyncError;
use crate::models::Command;

pub const FETCH_FAILURES: &str = "device_sync_fetch_failures_total";
pub const COMMAND_FAILURES: &str = "device_sync_command_failures_total";
pub const CYCLES: &str = "device_sync_cycles_total";
pub const STALE_CYCLES: &str = "device_sync_stale_cycles_total";

pub fn setup_metrics(port: u16) -> Result<(), SyncError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| SyncError::Config(format!("failed to start metrics exporter: {e}")))
}

/// Where swallowed failures and cycle outcomes go.
pub trait SyncObserver: Send + Sync {
    fn fetch_failed(&self, error: &SyncError);

    fn command_failed(&self, command: &Command, error: &SyncError);

    /// A fetch completed and its snapshot was fanned out.
    fn cycle_applied(&self, seq: u64, devices: usize);

    /// A fetch completed after a newer one had already been applied.
    fn stale_cycle_discarded(&self, seq: u64, newest: u64);
}

/// Logs through `tracing` and counts through `metrics`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsObserver;

impl SyncObserver for MetricsObserver {
    fn fetch_failed(&self, error: &SyncError) {
        warn!(%error, "polling fetch failed, treating as no devices");
        ::metrics::counter!(FETCH_FAILURES).increment(1);
    }

    fn command_failed(&self, command: &Command, error: &SyncError) {
        warn!(
            device_id = %command.device_id,
            command = %command.command,
            %error,
            "command dropped"
        );
        ::metrics::counter!(COMMAND_FAILURES, "command" => command.command.as_str()).increment(1);
    }

    fn cycle_applied(&self, seq: u64, devices: usize) {
        debug!(seq, devices, "cycle applied");
        ::metrics::counter!(CYCLES).increment(1);
    }

    fn stale_cycle_discarded(&self, seq: u64, newest: u64) {
        debug!(seq, newest, "stale cycle discarded");
        ::metrics::counter!(STALE_CYCLES).increment(1);
    }
}
