//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Server, provisioner and connection handlers produce:
//!     → logging.rs (human-readable log lines on stdout)
//!     → metrics.rs (counters and gauges)
//!
//! Consumers:
//!     → The person running the test (stdout)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Every send, disconnect and error is logged with its connection ID
//! - Metrics are recorded unconditionally; without an installed recorder
//!   the macros are no-ops

pub mod logging;
pub mod metrics;
