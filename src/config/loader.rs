//! Configuration loading from the command line and environment.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use crate::config::schema::{
    CertProviderKind, ServerConfig, CERT_DIR_NAME, DEFAULT_PORT, DEFAULT_SEND_INTERVAL,
};

/// Environment variable holding the listening port.
pub const PORT_ENV: &str = "WS_PORT";

/// Environment variable that enables TLS when set to exactly `"1"`.
pub const TLS_ENV: &str = "WSS";

/// Command-line arguments.
#[derive(Debug, Default, Parser)]
#[command(name = "ws-test-server")]
#[command(about = "WebSocket peer that emits periodic test messages", long_about = None)]
pub struct Cli {
    /// Serve wss:// with a self-signed certificate (also enabled by WSS=1).
    #[arg(long)]
    pub tls: bool,

    /// Listening port. Overrides WS_PORT.
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Certificate directory [default: <program dir>/.certs].
    #[arg(long)]
    pub cert_dir: Option<PathBuf>,

    /// How to synthesize the self-signed certificate.
    #[arg(long, value_enum, default_value_t = CertProviderKind::Openssl)]
    pub cert_provider: CertProviderKind,

    /// Expose Prometheus metrics on this address.
    #[arg(long)]
    pub metrics_address: Option<SocketAddr>,
}

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// `WS_PORT` is not a valid port number.
    InvalidPort(String),
    /// The directory of the running executable could not be determined.
    ProgramDir(std::io::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidPort(value) => {
                write!(f, "{} must be a port number, got {:?}", PORT_ENV, value)
            }
            ConfigError::ProgramDir(e) => write!(f, "cannot locate program directory: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl ServerConfig {
    /// Resolve configuration from the process environment.
    pub fn from_env(cli: &Cli) -> Result<Self, ConfigError> {
        Self::resolve(cli, |key| std::env::var(key).ok(), program_dir)
    }

    /// Resolve configuration with an explicit environment lookup.
    ///
    /// `--port` beats `WS_PORT`, which beats the default. TLS is on when
    /// `--tls` is given or `WSS` is exactly `"1"`.
    pub fn resolve<E, D>(cli: &Cli, env: E, program_dir: D) -> Result<Self, ConfigError>
    where
        E: Fn(&str) -> Option<String>,
        D: FnOnce() -> Result<PathBuf, ConfigError>,
    {
        let port = match (cli.port, env(PORT_ENV)) {
            (Some(port), _) => port,
            (None, Some(raw)) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(raw.clone()))?,
            (None, None) => DEFAULT_PORT,
        };

        let tls = cli.tls || env(TLS_ENV).as_deref() == Some("1");

        let cert_dir = match &cli.cert_dir {
            Some(dir) => dir.clone(),
            None => program_dir()?.join(CERT_DIR_NAME),
        };

        Ok(Self {
            port,
            tls,
            cert_dir,
            cert_provider: cli.cert_provider,
            send_interval: DEFAULT_SEND_INTERVAL,
            metrics_address: cli.metrics_address,
        })
    }
}

/// Directory containing the running executable.
fn program_dir() -> Result<PathBuf, ConfigError> {
    let exe = std::env::current_exe().map_err(ConfigError::ProgramDir)?;
    exe.parent().map(PathBuf::from).ok_or_else(|| {
        ConfigError::ProgramDir(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} has no parent directory", exe.display()),
        ))
    })
}
