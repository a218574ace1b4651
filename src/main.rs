//! WebSocket test server.
//!
//! # Architecture Overview
//!
//! ```text
//!   config (CLI + WS_PORT/WSS)
//!        │
//!        ▼
//!   net::certs ──▶ net::tls        (TLS mode only, before bind)
//!        │
//!        ▼
//!   http::server  ── accept ──▶ http::websocket (one task per client)
//!        │                          │ text every 3s, "Hello" every 5th
//!        ▼                          ▼
//!   lifecycle (Ctrl+C) ──────▶ Close frames, drain, exit 0
//! ```

use std::process::ExitCode;

use clap::Parser;

use ws_test_server::config::{Cli, ServerConfig};
use ws_test_server::lifecycle::signals::wait_for_signal;
use ws_test_server::observability::{logging, metrics};
use ws_test_server::{ServerError, WsServer};

#[tokio::main]
async fn main() -> ExitCode {
    logging::init_logging();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server failed to start");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), ServerError> {
    tracing::info!("ws-test-server v{} starting", env!("CARGO_PKG_VERSION"));

    let config = ServerConfig::from_env(&cli)?;
    tracing::info!(
        scheme = config.scheme(),
        port = config.port,
        cert_dir = %config.cert_dir.display(),
        "Configuration loaded"
    );

    if let Some(addr) = config.metrics_address {
        metrics::init_metrics(addr);
    }

    let server = WsServer::new(config).bind().await?;

    tracing::info!("Starting WebSocket test server on {}", server.url());
    tracing::info!("Press Ctrl+C to stop");
    tracing::info!("{}", "-".repeat(50));

    server.run(wait_for_signal()).await
}
