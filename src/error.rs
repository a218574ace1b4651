//! Error types for the test server.
//!
//! Startup failures (`ServerError`) are fatal and end the process with a
//! non-zero exit code. Per-connection failures (`ConnectionError`) are
//! contained in the connection's own task.

use std::io;

use thiserror::Error;

use crate::config::loader::ConfigError;
use crate::net::certs::CertError;

/// Fatal startup or serve error.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("certificate provisioning failed: {0}")]
    Certificate(#[from] CertError),

    #[error("failed to load TLS configuration: {0}")]
    Tls(#[source] io::Error),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] io::Error),
}

/// Why a single connection's send loop ended abnormally.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The peer went away. Expected, logged as a disconnect.
    #[error("connection closed by peer")]
    Closed,

    /// Any other transport or encoding fault.
    #[error("{0}")]
    Transport(String),
}

/// Display text of the WebSocket library's "already closed" errors.
const CLOSED_MESSAGES: &[&str] = &[
    "Connection closed normally",
    "Trying to work with closed connection",
    "Connection reset without closing handshake",
];

impl From<axum::Error> for ConnectionError {
    fn from(err: axum::Error) -> Self {
        let inner = err.into_inner();
        if is_peer_closed(inner.as_ref()) {
            ConnectionError::Closed
        } else {
            ConnectionError::Transport(inner.to_string())
        }
    }
}

impl From<serde_json::Error> for ConnectionError {
    fn from(err: serde_json::Error) -> Self {
        ConnectionError::Transport(format!("failed to encode payload: {}", err))
    }
}

/// Walk the source chain looking for a peer-initiated close.
fn is_peer_closed(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            if matches!(
                io_err.kind(),
                io::ErrorKind::BrokenPipe
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::UnexpectedEof
            ) {
                return true;
            }
        }
        let text = e.to_string();
        if CLOSED_MESSAGES.iter().any(|m| text.contains(m)) {
            return true;
        }
        current = e.source();
    }
    false
}
