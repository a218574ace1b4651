//! WebSocket connection handling.
//!
//! # Responsibilities
//! - Accept the upgrade on any path
//! - Assign a connection ID and track the connection
//! - Run the periodic send loop until the peer leaves or shutdown
//!
//! # Data Flow
//! ```text
//! every interval:  text {"type":"test","count":N,...}
//!                  [binary "Hello" when N % 5 == 0]
//! inbound frames:  drained while waiting, Close ends the loop
//! ```
//!
//! # Design Decisions
//! - The sink is owned by the loop, so frames for one count are never
//!   interleaved with another count's frames
//! - Errors end only this connection

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket},
        ConnectInfo, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};

use crate::error::ConnectionError;
use crate::http::payload::{binary_due, hex, TestMessage, HELLO};
use crate::http::server::AppState;
use crate::lifecycle::ShutdownSignal;
use crate::net::connection::ConnectionId;
use crate::observability::metrics::{self, FrameKind};

/// Upgrade handler mounted on every path.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
) -> Response {
    ws.on_failed_upgrade(move |e| {
        tracing::warn!(peer_addr = %peer, error = %e, "WebSocket upgrade failed");
    })
    .on_upgrade(move |socket| handle_socket(socket, state, peer))
}

async fn handle_socket(socket: WebSocket, state: AppState, peer: SocketAddr) {
    let guard = state.tracker.track();
    let id = guard.id();
    metrics::record_connection_opened();
    tracing::info!(connection_id = %id, peer_addr = %peer, "Client connected");

    let shutdown = state.shutdown.subscribe();
    let reason = match run_connection(socket, id, state.send_interval, shutdown).await {
        Ok(()) => {
            tracing::info!(connection_id = %id, "Closed client connection for shutdown");
            "shutdown"
        }
        Err(ConnectionError::Closed) => {
            tracing::info!(connection_id = %id, "Client disconnected");
            "peer_closed"
        }
        Err(ConnectionError::Transport(msg)) => {
            tracing::error!(connection_id = %id, error = %msg, "Error with client");
            "error"
        }
    };
    metrics::record_connection_closed(reason);
    drop(guard);
}

/// Send loop for one connection.
///
/// Returns `Ok(())` when stopped by shutdown.
async fn run_connection(
    socket: WebSocket,
    id: ConnectionId,
    interval: Duration,
    mut shutdown: ShutdownSignal,
) -> Result<(), ConnectionError> {
    let (mut sink, mut stream) = socket.split();
    let mut count: u64 = 0;

    loop {
        count += 1;

        let payload = TestMessage::new(count).to_json()?;
        sink.send(Message::Text(payload.clone().into())).await?;
        metrics::record_frame_sent(FrameKind::Text);
        tracing::info!(connection_id = %id, payload = %payload, "Sent text message");

        let sleep = tokio::time::sleep(interval);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => break,
                _ = shutdown.recv() => {
                    let frame = CloseFrame {
                        code: close_code::AWAY,
                        reason: "server shutting down".into(),
                    };
                    // Best effort, the peer may already be gone.
                    let _ = sink.send(Message::Close(Some(frame))).await;
                    return Ok(());
                }
                inbound = stream.next() => match inbound {
                    Some(Ok(Message::Close(frame))) => {
                        tracing::debug!(connection_id = %id, frame = ?frame, "Received close frame");
                        // Flush the library's queued Close reply so the
                        // closing handshake completes.
                        let _ = sink.close().await;
                        return Err(ConnectionError::Closed);
                    }
                    Some(Ok(msg)) => {
                        tracing::debug!(connection_id = %id, message = ?msg, "Ignoring inbound frame");
                    }
                    Some(Err(e)) => return Err(e.into()),
                    None => return Err(ConnectionError::Closed),
                },
            }
        }

        if binary_due(count) {
            sink.send(Message::Binary(Bytes::from_static(&HELLO))).await?;
            metrics::record_frame_sent(FrameKind::Binary);
            tracing::info!(connection_id = %id, payload = %hex(&HELLO), "Sent binary message");
        }
    }
}
