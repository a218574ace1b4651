//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (TLS mode only)
//!     → certs.rs (ensure cert.pem/key.pem exist and are fresh)
//!     → tls.rs (load PEM pair into a rustls server config)
//!
//! Accepted WebSocket
//!     → connection.rs (assign ConnectionId, track active count)
//!     → Hand off to the send loop in http::websocket
//! ```
//!
//! # Design Decisions
//! - Certificates are provisioned before the listener binds
//! - Certificate synthesis sits behind a trait so openssl is optional
//! - Connection tracking is a single atomic, no shared roster

pub mod certs;
pub mod connection;
pub mod tls;
