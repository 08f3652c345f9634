//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use papermark_edge::config::EdgeConfig;
use papermark_edge::http::{AppState, HttpServer};
use papermark_edge::lifecycle::Shutdown;
use papermark_edge::session::{SessionDecoder, SessionError, SessionToken, SessionUser};

#[allow(dead_code)]
/// Start a mock app that answers every request with its request line and
/// the forwarded host, e.g. `GET /dashboard\nhost=app.papermark.com`.
pub async fn start_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    }
                }

                let head = String::from_utf8_lossy(&buf).to_string();
                let mut lines = head.lines();
                let request_line = lines.next().unwrap_or_default();
                let target = request_line.rsplit_once(' ').map_or(request_line, |(l, _)| l);
                let forwarded = lines
                    .filter_map(|l| l.split_once(':'))
                    .find(|(k, _)| k.eq_ignore_ascii_case("x-forwarded-host"))
                    .map(|(_, v)| v.trim().to_string())
                    .unwrap_or_default();

                let body = format!("{}\nhost={}", target, forwarded);
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// An address nothing listens on.
#[allow(dead_code)]
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Accepts any token except `"bad"` as a long-standing account.
pub struct FakeDecoder;

impl SessionDecoder for FakeDecoder {
    fn decode(&self, raw: &str) -> Result<SessionToken, SessionError> {
        if raw == "bad" {
            return Err(SessionError::NotConfigured);
        }
        Ok(SessionToken {
            email: Some(format!("{}@example.com", raw)),
            user: Some(SessionUser {
                created_at: Some("2020-01-01T00:00:00Z".into()),
            }),
        })
    }
}

/// Edge config pointed at `upstream`.
pub fn edge_config(upstream: SocketAddr) -> EdgeConfig {
    let mut config = EdgeConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.upstream.app_address = upstream.to_string();
    config.webhooks.base_host = Some("hooks.papermark.com".into());
    config
}

/// Start the edge server with the fake decoder. Keep the returned
/// `Shutdown` alive for the duration of the test.
#[allow(dead_code)]
pub async fn start_edge(config: EdgeConfig) -> (SocketAddr, AppState, Arc<Shutdown>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let state = AppState::new(config).unwrap().with_decoder(Arc::new(FakeDecoder));
    let server = HttpServer::from_state(state.clone());
    let shutdown = Arc::new(Shutdown::new());
    let rx = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, None, rx).await;
    });

    (addr, state, shutdown)
}

/// Client that reports redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
