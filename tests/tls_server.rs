//! End-to-end tests for `wss://` mode with a self-signed certificate.

use std::fs;

use tokio_tungstenite::connect_async_tls_with_config;

use ws_test_server::config::CertProviderKind;
use ws_test_server::http::HELLO;
use ws_test_server::net::certs::CertPaths;
use ws_test_server::{ServerConfig, ServerError, WsServer};

mod common;
use common::{collect_texts, pinned_connector, test_config, within, Frame, TestServer};

fn tls_config(cert_dir: &std::path::Path) -> ServerConfig {
    ServerConfig {
        tls: true,
        cert_dir: cert_dir.to_path_buf(),
        cert_provider: CertProviderKind::Rcgen,
        ..test_config()
    }
}

#[tokio::test]
async fn test_wss_provisions_once_and_serves() {
    let tmp = tempfile::tempdir().unwrap();
    let cert_dir = tmp.path().join(".certs");
    let paths = CertPaths::in_dir(&cert_dir);

    let server = TestServer::start(tls_config(&cert_dir)).await;
    assert!(server.url.starts_with("wss://127.0.0.1:"), "url = {}", server.url);
    assert!(paths.cert.is_file() && paths.key.is_file());
    let cert_mtime = fs::metadata(&paths.cert).unwrap().modified().unwrap();
    let key_mtime = fs::metadata(&paths.key).unwrap().modified().unwrap();

    let connector = pinned_connector(&paths.cert);
    let (mut ws, _) = within(connect_async_tls_with_config(
        server.url.as_str(),
        None,
        false,
        Some(connector),
    ))
    .await
    .expect("TLS connect failed");

    let frames = collect_texts(&mut ws, 6).await;
    match &frames[0] {
        Frame::Text(msg) => assert_eq!(msg.count, 1),
        other => panic!("unexpected first frame: {:?}", other),
    }
    assert_eq!(frames[5], Frame::Binary(HELLO.to_vec()));

    server.stop().await.unwrap();

    // A second startup reuses the pair untouched.
    let again = TestServer::start(tls_config(&cert_dir)).await;
    assert_eq!(fs::metadata(&paths.cert).unwrap().modified().unwrap(), cert_mtime);
    assert_eq!(fs::metadata(&paths.key).unwrap().modified().unwrap(), key_mtime);
    again.stop().await.unwrap();
}

#[tokio::test]
async fn test_certificate_failure_aborts_before_bind() {
    let tmp = tempfile::tempdir().unwrap();
    // A regular file where the cert directory should go.
    let blocker = tmp.path().join("not-a-dir");
    fs::write(&blocker, "x").unwrap();

    let config = tls_config(&blocker);
    let port_probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = port_probe.local_addr().unwrap().port();
    drop(port_probe);

    let err = WsServer::new(ServerConfig { port, ..config })
        .bind()
        .await
        .err();
    assert!(
        matches!(err, Some(ServerError::Certificate(_))),
        "expected certificate error, got {:?}",
        err
    );

    // Nothing was left listening on the port.
    assert!(std::net::TcpListener::bind(("127.0.0.1", port)).is_ok());
}
