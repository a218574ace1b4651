//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! command line (clap) + environment (WS_PORT, WSS)
//!     → loader.rs (precedence & parsing)
//!     → ServerConfig (resolved, immutable)
//!     → handed to the server at bind time
//! ```
//!
//! # Design Decisions
//! - Config is resolved once at startup; nothing reloads it
//! - The host is fixed to loopback, only the port is configurable
//! - Environment lookups go through a closure so resolution is testable

pub mod loader;
pub mod schema;

pub use loader::{Cli, ConfigError};
pub use schema::{CertProviderKind, ServerConfig};
