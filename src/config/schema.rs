//! Configuration schema definitions.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Fixed listening host.
pub const HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Port used when neither `--port` nor `WS_PORT` is set.
pub const DEFAULT_PORT: u16 = 8765;

/// Delay between consecutive text messages on a connection.
pub const DEFAULT_SEND_INTERVAL: Duration = Duration::from_secs(3);

/// Name of the certificate cache directory next to the executable.
pub const CERT_DIR_NAME: &str = ".certs";

/// Which backend synthesizes the self-signed certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CertProviderKind {
    /// Shell out to the `openssl` command-line tool.
    #[default]
    Openssl,
    /// Generate in-process with rcgen.
    Rcgen,
}

/// Resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listening port. `0` lets the OS pick one.
    pub port: u16,

    /// Serve `wss://` instead of `ws://`.
    pub tls: bool,

    /// Directory holding `cert.pem` and `key.pem`.
    pub cert_dir: PathBuf,

    /// Certificate synthesis backend.
    pub cert_provider: CertProviderKind,

    /// Period of the per-connection send loop.
    pub send_interval: Duration,

    /// Optional Prometheus scrape address.
    pub metrics_address: Option<SocketAddr>,
}

impl ServerConfig {
    /// Socket address the listener binds to.
    pub fn bind_address(&self) -> SocketAddr {
        SocketAddr::new(HOST, self.port)
    }

    /// URL scheme clients should use.
    pub fn scheme(&self) -> &'static str {
        if self.tls {
            "wss"
        } else {
            "ws"
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            tls: false,
            cert_dir: PathBuf::from(CERT_DIR_NAME),
            cert_provider: CertProviderKind::default(),
            send_interval: DEFAULT_SEND_INTERVAL,
            metrics_address: None,
        }
    }
}
