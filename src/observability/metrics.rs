//! Metrics collection and exposition.
//!
//! # Metrics
//! - `ws_frames_sent_total` (counter): frames sent, labelled by `kind`
//! - `ws_connections_total` (counter): accepted WebSocket connections
//! - `ws_disconnects_total` (counter): ended connections, labelled by `reason`
//! - `ws_active_connections` (gauge): current connection count

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Which frame went out.
#[derive(Debug, Clone, Copy)]
pub enum FrameKind {
    Text,
    Binary,
}

impl FrameKind {
    fn as_str(self) -> &'static str {
        match self {
            FrameKind::Text => "text",
            FrameKind::Binary => "binary",
        }
    }
}

pub fn record_frame_sent(kind: FrameKind) {
    ::metrics::counter!("ws_frames_sent_total", "kind" => kind.as_str()).increment(1);
}

pub fn record_connection_opened() {
    ::metrics::counter!("ws_connections_total").increment(1);
}

pub fn record_connection_closed(reason: &'static str) {
    ::metrics::counter!("ws_disconnects_total", "reason" => reason).increment(1);
}

pub fn record_active_connections(count: u64) {
    ::metrics::gauge!("ws_active_connections").set(count as f64);
}
