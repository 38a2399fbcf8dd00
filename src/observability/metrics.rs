//! Metrics collection and exposition.
//!
//! # Metrics
//! - `realip_resolutions_total` (counter): resolutions by winning `source`
//! - `realip_panics_total` (counter): handler panics recovered
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Count one client IP resolution.
pub fn record_resolution(source: &'static str) {
    metrics::counter!("realip_resolutions_total", "source" => source).increment(1);
}

/// Count one recovered panic.
pub fn record_panic() {
    metrics::counter!("realip_panics_total").increment(1);
}
