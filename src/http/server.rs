//! WebSocket server setup.
//!
//! # Responsibilities
//! - Provision certificates and load the rustls config in TLS mode
//! - Bind the listener on the configured loopback port
//! - Create the Axum Router that upgrades every path
//! - Serve until the shutdown future resolves, then drain handlers

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use axum::{routing::any, Router};
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::http::websocket::ws_handler;
use crate::lifecycle::Shutdown;
use crate::net::certs;
use crate::net::connection::ConnectionTracker;
use crate::net::tls::load_tls_config;

/// How long shutdown waits for connection handlers to finish.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub tracker: ConnectionTracker,
    pub shutdown: Shutdown,
    pub send_interval: Duration,
}

/// WebSocket test server, not yet bound.
pub struct WsServer {
    config: ServerConfig,
    state: AppState,
}

impl WsServer {
    /// Create a new server with the given configuration.
    pub fn new(config: ServerConfig) -> Self {
        let state = AppState {
            tracker: ConnectionTracker::new(),
            shutdown: Shutdown::new(),
            send_interval: config.send_interval,
        };
        Self { config, state }
    }

    /// Build the Axum router. Any path accepts the upgrade.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/", any(ws_handler))
            .route("/{*path}", any(ws_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// Prepare TLS if enabled and bind the listener.
    ///
    /// In TLS mode the certificate pair is provisioned before the socket is
    /// opened, so a provisioning failure never leaves a half-started server.
    pub async fn bind(self) -> Result<BoundServer, ServerError> {
        let tls = if self.config.tls {
            let paths = certs::provision(
                self.config.cert_dir.clone(),
                self.config.cert_provider.provider(),
            )
            .await?;
            Some(load_tls_config(&paths).await.map_err(ServerError::Tls)?)
        } else {
            None
        };

        let addr = self.config.bind_address();
        let bind_err = |source| ServerError::Bind {
            addr: addr.to_string(),
            source,
        };
        let listener = std::net::TcpListener::bind(addr).map_err(bind_err)?;
        listener.set_nonblocking(true).map_err(bind_err)?;
        let local_addr = listener.local_addr().map_err(bind_err)?;

        tracing::info!(address = %local_addr, tls = tls.is_some(), "Listener bound");

        Ok(BoundServer {
            listener,
            local_addr,
            scheme: self.config.scheme(),
            tls,
            router: Self::build_router(self.state.clone()),
            state: self.state,
        })
    }
}

/// A server whose listener is open but not yet serving.
pub struct BoundServer {
    listener: std::net::TcpListener,
    local_addr: SocketAddr,
    scheme: &'static str,
    tls: Option<RustlsConfig>,
    router: Router,
    state: AppState,
}

impl BoundServer {
    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// `ws://host:port` or `wss://host:port`.
    pub fn url(&self) -> String {
        format!("{}://{}", self.scheme, self.local_addr)
    }

    /// Handle on the live connection count.
    pub fn connections(&self) -> ConnectionTracker {
        self.state.tracker.clone()
    }

    /// Serve until `signal` resolves.
    ///
    /// On shutdown every handler sends a Close frame, the listener stops
    /// accepting, and this waits up to [`DRAIN_TIMEOUT`] for handlers to end.
    pub async fn run<F>(self, signal: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let shutdown = self.state.shutdown.clone();
        let on_signal = async move {
            signal.await;
            tracing::info!(
                handlers = shutdown.receiver_count(),
                "Shutdown signal received"
            );
            shutdown.trigger();
        };

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        match self.tls {
            None => {
                let listener = TcpListener::from_std(self.listener).map_err(ServerError::Serve)?;
                axum::serve(listener, app)
                    .with_graceful_shutdown(on_signal)
                    .await
                    .map_err(ServerError::Serve)?;
            }
            Some(tls) => {
                let handle = axum_server::Handle::new();
                let trigger = handle.clone();
                tokio::spawn(async move {
                    on_signal.await;
                    trigger.graceful_shutdown(Some(DRAIN_TIMEOUT));
                });
                axum_server::from_tcp_rustls(self.listener, tls)
                    .handle(handle)
                    .serve(app)
                    .await
                    .map_err(ServerError::Serve)?;
            }
        }

        let tracker = self.state.tracker;
        if tokio::time::timeout(DRAIN_TIMEOUT, tracker.wait_until_idle())
            .await
            .is_err()
        {
            tracing::warn!(
                remaining = tracker.active_count(),
                "Connections still open after drain timeout"
            );
        }

        tracing::info!("Server stopped");
        Ok(())
    }
}
