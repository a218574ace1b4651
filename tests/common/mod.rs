//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, SignatureScheme};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{Connector, WebSocketStream};

use ws_test_server::http::TestMessage;
use ws_test_server::net::connection::ConnectionTracker;
use ws_test_server::{ServerConfig, ServerError, WsServer};

/// Send interval used by tests so sequences arrive quickly.
pub const TEST_INTERVAL: Duration = Duration::from_millis(50);

const FRAME_TIMEOUT: Duration = Duration::from_secs(5);

/// Loopback config on an OS-assigned port.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        port: 0,
        send_interval: TEST_INTERVAL,
        ..ServerConfig::default()
    }
}

/// A server running on a background task.
pub struct TestServer {
    pub addr: SocketAddr,
    pub url: String,
    pub connections: ConnectionTracker,
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<Result<(), ServerError>>,
}

impl TestServer {
    pub async fn start(config: ServerConfig) -> Self {
        let bound = WsServer::new(config).bind().await.expect("server failed to bind");
        let addr = bound.local_addr();
        let url = bound.url();
        let connections = bound.connections();

        let (stop, stopped) = oneshot::channel::<()>();
        let handle = tokio::spawn(bound.run(async move {
            let _ = stopped.await;
        }));

        Self {
            addr,
            url,
            connections,
            stop: Some(stop),
            handle,
        }
    }

    /// Trigger shutdown and wait for `run` to return.
    pub async fn stop(mut self) -> Result<(), ServerError> {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        tokio::time::timeout(Duration::from_secs(10), self.handle)
            .await
            .expect("server did not stop in time")
            .expect("server task panicked")
    }
}

/// What the client saw next.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Text(TestMessage),
    Binary(Vec<u8>),
    Closed,
}

/// Read the next data frame, skipping control frames.
pub async fn next_frame<S>(ws: &mut WebSocketStream<S>) -> Frame
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let msg = tokio::time::timeout(FRAME_TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for a frame");
        match msg {
            Some(Ok(Message::Text(text))) => {
                let parsed = serde_json::from_str(text.as_str()).expect("malformed test message");
                return Frame::Text(parsed);
            }
            Some(Ok(Message::Binary(bytes))) => return Frame::Binary(bytes.to_vec()),
            Some(Ok(Message::Close(_))) | None => return Frame::Closed,
            Some(Ok(_)) => continue,
            Some(Err(e)) => panic!("websocket error: {}", e),
        }
    }
}

/// Read frames until `texts` text frames have arrived.
pub async fn collect_texts<S>(ws: &mut WebSocketStream<S>, texts: usize) -> Vec<Frame>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut frames = Vec::new();
    let mut seen = 0;
    while seen < texts {
        let frame = next_frame(ws).await;
        match &frame {
            Frame::Text(_) => seen += 1,
            Frame::Closed => panic!("connection closed after {} frames", frames.len()),
            Frame::Binary(_) => {}
        }
        frames.push(frame);
    }
    frames
}

/// Poll `condition` until it holds or `timeout` passes.
pub async fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

/// Run `fut` with a generous timeout.
pub async fn within<F: Future>(fut: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(10), fut)
        .await
        .expect("operation timed out")
}

/// Client connector that trusts exactly the certificate in `cert_path`.
pub fn pinned_connector(cert_path: &Path) -> Connector {
    let file = std::fs::File::open(cert_path).expect("cert.pem missing");
    let cert = rustls_pemfile::certs(&mut std::io::BufReader::new(file))
        .next()
        .expect("no certificate in cert.pem")
        .expect("unreadable certificate");

    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let config = rustls::ClientConfig::builder_with_provider(Arc::clone(&provider))
        .with_safe_default_protocol_versions()
        .expect("protocol versions")
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(PinnedCert { cert, provider }))
        .with_no_client_auth();

    Connector::Rustls(Arc::new(config))
}

/// Accepts the one self-signed certificate the server generated.
#[derive(Debug)]
struct PinnedCert {
    cert: CertificateDer<'static>,
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for PinnedCert {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        if end_entity.as_ref() == self.cert.as_ref() {
            Ok(ServerCertVerified::assertion())
        } else {
            Err(rustls::Error::General("unexpected server certificate".into()))
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}
