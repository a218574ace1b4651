//! Self-signed certificate provisioning for TLS mode.
//!
//! # Responsibilities
//! - Create the certificate cache directory
//! - Reuse an existing `cert.pem`/`key.pem` pair while it is fresh
//! - Otherwise synthesize a new pair through a [`CertificateProvider`]
//!
//! The pair is scoped to `localhost` and `127.0.0.1` and is valid for one
//! day. Freshness is judged by file modification time, so a pair left over
//! from an earlier run is regenerated once it would have expired instead of
//! being served stale.

use std::fs;
use std::io;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::time::{Duration, SystemTime};

use chrono::{Datelike, Days, Utc};
use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair, SanType};
use thiserror::Error;

use crate::config::CertProviderKind;

/// How long a generated pair is valid.
pub const CERT_VALIDITY: Duration = Duration::from_secs(24 * 60 * 60);

const COMMON_NAME: &str = "localhost";

/// Error raised while provisioning certificates.
#[derive(Debug, Error)]
pub enum CertError {
    #[error("{action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to run {program} (is it installed?): {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    ToolFailed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("certificate synthesis failed: {0}")]
    Rcgen(#[from] rcgen::Error),

    #[error("certificate task failed: {0}")]
    Join(String),
}

/// Fixed locations of the PEM pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

impl CertPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            cert: dir.join("cert.pem"),
            key: dir.join("key.pem"),
        }
    }

    fn both_exist(&self) -> bool {
        self.cert.is_file() && self.key.is_file()
    }

    /// Age of the older of the two files.
    fn age(&self) -> Result<Duration, CertError> {
        let mut oldest = SystemTime::now();
        for path in [&self.cert, &self.key] {
            let modified = fs::metadata(path)
                .and_then(|m| m.modified())
                .map_err(|source| CertError::Io {
                    action: "failed to stat",
                    path: path.clone(),
                    source,
                })?;
            oldest = oldest.min(modified);
        }
        // Files stamped in the future count as brand new.
        Ok(SystemTime::now()
            .duration_since(oldest)
            .unwrap_or(Duration::ZERO))
    }
}

/// Something that can write a self-signed pair to disk.
pub trait CertificateProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Write a fresh pair to `paths`, replacing whatever is there.
    fn generate(&self, paths: &CertPaths) -> Result<(), CertError>;
}

impl CertProviderKind {
    /// Build the provider this kind names.
    pub fn provider(self) -> Box<dyn CertificateProvider> {
        match self {
            CertProviderKind::Openssl => Box::new(OpensslProvider::default()),
            CertProviderKind::Rcgen => Box::new(RcgenProvider),
        }
    }
}

/// Shells out to `openssl req -x509`.
#[derive(Debug, Clone)]
pub struct OpensslProvider {
    program: String,
}

impl OpensslProvider {
    /// Use a specific executable instead of `openssl` from `PATH`.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, paths: &CertPaths) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(["req", "-x509", "-newkey", "rsa:2048", "-keyout"])
            .arg(&paths.key)
            .arg("-out")
            .arg(&paths.cert)
            .args(["-days", "1", "-nodes", "-subj"])
            .arg(format!("/CN={}", COMMON_NAME))
            .args(["-addext", "subjectAltName=DNS:localhost,IP:127.0.0.1"]);
        cmd
    }
}

impl Default for OpensslProvider {
    fn default() -> Self {
        Self::with_program("openssl")
    }
}

impl CertificateProvider for OpensslProvider {
    fn name(&self) -> &'static str {
        "openssl"
    }

    fn generate(&self, paths: &CertPaths) -> Result<(), CertError> {
        let output = self
            .command(paths)
            .output()
            .map_err(|source| CertError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        tracing::debug!(
            stdout = %String::from_utf8_lossy(&output.stdout).trim(),
            stderr = %String::from_utf8_lossy(&output.stderr).trim(),
            "openssl finished"
        );

        if !output.status.success() {
            return Err(CertError::ToolFailed {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

/// Generates the pair in-process, no external tools needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct RcgenProvider;

impl CertificateProvider for RcgenProvider {
    fn name(&self) -> &'static str {
        "rcgen"
    }

    fn generate(&self, paths: &CertPaths) -> Result<(), CertError> {
        let mut params = CertificateParams::default();
        let mut name = DistinguishedName::new();
        name.push(DnType::CommonName, COMMON_NAME);
        params.distinguished_name = name;
        params.subject_alt_names = vec![
            SanType::DnsName(COMMON_NAME.try_into()?),
            SanType::IpAddress(IpAddr::V4(Ipv4Addr::LOCALHOST)),
        ];

        // rcgen takes calendar dates; start of today until the end of
        // tomorrow keeps at least a full day of validity from now.
        let today = Utc::now().date_naive();
        let until = today.checked_add_days(Days::new(2)).unwrap_or(today);
        params.not_before =
            rcgen::date_time_ymd(today.year(), today.month() as u8, today.day() as u8);
        params.not_after =
            rcgen::date_time_ymd(until.year(), until.month() as u8, until.day() as u8);

        let key_pair = KeyPair::generate()?;
        let cert = params.self_signed(&key_pair)?;

        write_pem(&paths.cert, &cert.pem(), false)?;
        write_pem(&paths.key, &key_pair.serialize_pem(), true)?;
        Ok(())
    }
}

fn write_pem(path: &Path, contents: &str, private: bool) -> Result<(), CertError> {
    let io_err = |source| CertError::Io {
        action: "failed to write",
        path: path.to_path_buf(),
        source,
    };
    fs::write(path, contents).map_err(io_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if private {
            fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(io_err)?;
        }
    }
    #[cfg(not(unix))]
    let _ = private;

    Ok(())
}

/// Make sure a usable pair exists in `dir`, generating one if needed.
pub fn ensure_certificates(
    dir: &Path,
    provider: &dyn CertificateProvider,
) -> Result<CertPaths, CertError> {
    fs::create_dir_all(dir).map_err(|source| CertError::Io {
        action: "failed to create",
        path: dir.to_path_buf(),
        source,
    })?;

    let paths = CertPaths::in_dir(dir);

    if paths.both_exist() {
        let age = paths.age()?;
        if age < CERT_VALIDITY {
            tracing::info!(
                cert = %paths.cert.display(),
                key = %paths.key.display(),
                "Reusing existing certificate"
            );
            return Ok(paths);
        }
        tracing::warn!(
            cert = %paths.cert.display(),
            age_secs = age.as_secs(),
            "Existing certificate has expired, regenerating"
        );
    }

    tracing::info!(provider = provider.name(), "Generating self-signed certificate");
    provider.generate(&paths)?;

    if !paths.both_exist() {
        return Err(CertError::Io {
            action: "provider did not produce",
            path: paths.cert.clone(),
            source: io::Error::new(io::ErrorKind::NotFound, "certificate or key missing"),
        });
    }

    tracing::info!(
        cert = %paths.cert.display(),
        key = %paths.key.display(),
        "Generated self-signed certificate"
    );
    Ok(paths)
}

/// Run [`ensure_certificates`] on the blocking pool.
pub async fn provision(
    dir: PathBuf,
    provider: Box<dyn CertificateProvider>,
) -> Result<CertPaths, CertError> {
    tokio::task::spawn_blocking(move || ensure_certificates(&dir, provider.as_ref()))
        .await
        .map_err(|e| CertError::Join(e.to_string()))?
}
