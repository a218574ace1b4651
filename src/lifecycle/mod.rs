//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGINT (Ctrl+C) / SIGTERM → resolve the shutdown future
//!
//! Shutdown (shutdown.rs):
//!     Trigger → connection handlers send Close and exit
//!             → listener stops accepting → process exits 0
//! ```
//!
//! # Design Decisions
//! - Interruption is the normal way to stop, never an error
//! - Handlers observe shutdown even if they subscribe after the trigger

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, ShutdownSignal};
