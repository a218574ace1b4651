//! WebSocket test server library.
//!
//! A predictable peer for exercising WebSocket clients: every connection
//! receives a numbered JSON text frame on a fixed interval, plus a binary
//! "Hello" frame after every fifth one. TLS mode serves `wss://` with a
//! self-signed certificate provisioned on first start.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::ServerConfig;
pub use error::ServerError;
pub use http::{BoundServer, WsServer};
pub use lifecycle::Shutdown;
