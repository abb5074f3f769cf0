//! Metrics recorder and domain counters for invoicing-service.
//!
//! The Prometheus recorder is installed once at startup; `/metrics` renders
//! from the handle kept here.

use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Instant;

pub const INVOICES_CREATED_TOTAL: &str = "invoicing_invoices_created_total";
pub const INVOICES_UPDATED_TOTAL: &str = "invoicing_invoices_updated_total";
pub const INVOICES_DELETED_TOTAL: &str = "invoicing_invoices_deleted_total";
pub const SIGNUPS_TOTAL: &str = "invoicing_signups_total";
pub const LOGINS_TOTAL: &str = "invoicing_logins_total";
pub const STORE_QUERY_DURATION: &str = "invoicing_store_query_duration_seconds";

const STORE_BUCKETS: &[f64] = &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0];

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the global Prometheus recorder.
///
/// Must run before anything is recorded. A second call is a no-op.
pub fn init_metrics() -> Result<(), anyhow::Error> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(STORE_QUERY_DURATION.to_string()),
            STORE_BUCKETS,
        )
        .map_err(|e| anyhow::anyhow!("Invalid histogram buckets: {}", e))?
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus recorder: {}", e))?;

    if METRICS_HANDLE.set(handle).is_err() {
        tracing::warn!("Metrics handle already set; keeping the first recorder");
    }
    Ok(())
}

/// Current metrics in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

pub fn record_store_latency(operation: &'static str, started: Instant) {
    metrics::histogram!(STORE_QUERY_DURATION, "operation" => operation)
        .record(started.elapsed().as_secs_f64());
}

pub fn record_login(outcome: &'static str) {
    metrics::counter!(LOGINS_TOTAL, "outcome" => outcome).increment(1);
}
