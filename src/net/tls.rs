//! TLS configuration and certificate loading.

use std::path::Path;

use axum_server::tls_rustls::RustlsConfig;

use crate::net::certs::CertPaths;

/// Load TLS configuration from certificate and key files.
pub async fn load_tls_config(paths: &CertPaths) -> Result<RustlsConfig, std::io::Error> {
    ensure_exists(&paths.cert, "Certificate")?;
    ensure_exists(&paths.key, "Private key")?;

    install_crypto_provider();
    RustlsConfig::from_pem_file(&paths.cert, &paths.key).await
}

fn ensure_exists(path: &Path, what: &str) -> Result<(), std::io::Error> {
    if path.exists() {
        Ok(())
    } else {
        Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} file not found: {}", what, path.display()),
        ))
    }
}

/// Pin the process-wide rustls provider.
///
/// A second call returns an error from rustls, which is fine to ignore.
fn install_crypto_provider() {
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
}
