//! HTTP/WebSocket protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, plain or rustls listener)
//!     → websocket.rs (upgrade on any path, per-connection send loop)
//!     → payload.rs (JSON text frame, binary "Hello" frame)
//!     → Send to client
//! ```

pub mod payload;
pub mod server;
pub mod websocket;

pub use payload::{TestMessage, HELLO};
pub use server::{BoundServer, WsServer};
