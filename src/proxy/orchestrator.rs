//! Per-connection orchestration.
//!
//! # Responsibilities
//! - Read and normalize the client's request head
//! - Reject malformed requests with 400 and stop
//! - Connect to the resolved target, forward the head, relay the response
//! - Turn target failures into 502/504 while the client can still be told
//!
//! # Stages
//! ```text
//! Parsing ──(parse error)──▶ BadRequest (terminal)
//!    │
//!    ▼
//! Connecting ──(failure)──▶ UpstreamFailed (terminal)
//!    │
//!    ▼
//! Forwarding ──▶ Relayed (terminal)
//! ```
//!
//! # Design Decisions
//! - The parsed request, target stream and buffers belong to this call alone
//! - No retries; every failure ends the connection

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::config::ProxyConfig;
use crate::http::{read_request, ErrorResponse, LineReader, NormalizeSettings, ParseError, Target};
use crate::resilience::timeouts::{from_secs, with_timeout, Elapsed};
use crate::upstream::{self, UpstreamError};

/// Everything a connection needs from configuration.
#[derive(Debug, Clone)]
pub struct ProxySettings {
    pub normalize: NormalizeSettings,
    pub max_line_bytes: usize,
    pub client_read_timeout: Duration,
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
}

impl From<&ProxyConfig> for ProxySettings {
    fn from(config: &ProxyConfig) -> Self {
        Self {
            normalize: NormalizeSettings::from(config),
            max_line_bytes: config.limits.max_line_bytes,
            client_read_timeout: from_secs(config.timeouts.client_read_secs),
            connect_timeout: from_secs(config.timeouts.connect_secs),
            idle_timeout: from_secs(config.timeouts.idle_secs),
        }
    }
}

/// How a connection ended.
#[derive(Debug)]
pub enum Outcome {
    /// The client closed before sending a request.
    ClientClosed,
    /// The request head was malformed or unreadable.
    BadRequest(ParseError),
    /// The client did not deliver a complete head in time.
    ClientTimeout(Elapsed),
    /// Connecting to or relaying from the target failed.
    UpstreamFailed { target: Target, error: UpstreamError },
    /// The target's response was relayed to the client.
    Relayed { target: Target, bytes: u64 },
}

impl Outcome {
    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::ClientClosed => "client_closed",
            Outcome::BadRequest(e) if e.is_transport() => "client_error",
            Outcome::BadRequest(_) => "bad_request",
            Outcome::ClientTimeout(_) => "client_timeout",
            Outcome::UpstreamFailed { .. } => "upstream_error",
            Outcome::Relayed { .. } => "relayed",
        }
    }
}

/// Serve one client connection from request head to relayed response.
pub async fn serve_connection<S>(client: S, settings: &ProxySettings) -> Outcome
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (client_read, mut client_write) = tokio::io::split(client);
    let mut reader = LineReader::new(client_read, settings.max_line_bytes);

    let parsed = with_timeout(
        "client_read",
        settings.client_read_timeout,
        read_request(&mut reader, &settings.normalize),
    )
    .await;
    let request = match parsed {
        Ok(Ok(Some(request))) => request,
        Ok(Ok(None)) => return Outcome::ClientClosed,
        Ok(Err(error)) => {
            if !error.is_transport() {
                reject(&mut client_write, ErrorResponse::BadRequest).await;
            }
            return Outcome::BadRequest(error);
        }
        Err(elapsed) => {
            reject(&mut client_write, ErrorResponse::RequestTimeout).await;
            return Outcome::ClientTimeout(elapsed);
        }
    };

    // Bodies and pipelined requests are not forwarded; the bytes are dropped.
    let leftover = reader.buffered_len();
    if leftover > 0 {
        tracing::error!(leftover, "Client bytes left unread after the request head");
    }
    drop(reader);

    let target = request.target().clone();
    tracing::debug!(
        origin = %target,
        request_line = request.request_line().trim_end(),
        header_lines = request.headers().lines().len(),
        "Request normalized"
    );

    let mut origin = match upstream::connect(&target, settings.connect_timeout).await {
        Ok(stream) => stream,
        Err(error) => return fail_upstream(&mut client_write, target, error).await,
    };

    let sent = upstream::send_request(&mut origin, &request).await;
    drop(request);
    if let Err(error) = sent {
        return fail_upstream(&mut client_write, target, error).await;
    }

    match upstream::relay_response(&mut origin, &mut client_write, settings.idle_timeout).await {
        Ok(bytes) => {
            let _ = client_write.shutdown().await;
            Outcome::Relayed { target, bytes }
        }
        Err(error) => fail_upstream(&mut client_write, target, error).await,
    }
}

async fn fail_upstream<W>(client: &mut W, target: Target, error: UpstreamError) -> Outcome
where
    W: AsyncWrite + Unpin,
{
    match error.response() {
        Some(response) => reject(client, response).await,
        None => {
            let _ = client.shutdown().await;
        }
    }
    Outcome::UpstreamFailed { target, error }
}

async fn reject<W>(client: &mut W, response: ErrorResponse)
where
    W: AsyncWrite + Unpin,
{
    if let Err(e) = response.send(client).await {
        tracing::debug!(status = response.status(), error = %e, "Failed to send error response");
    }
    let _ = client.shutdown().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    fn settings() -> ProxySettings {
        let mut config = ProxyConfig::default();
        config.timeouts.connect_secs = 2;
        config.timeouts.idle_secs = 2;
        config.timeouts.client_read_secs = 2;
        ProxySettings::from(&config)
    }

    async fn exchange(request: &[u8]) -> (Outcome, String) {
        let (client, proxy_side) = tokio::io::duplex(64 * 1024);
        let (mut client_read, mut client_write) = tokio::io::split(client);
        client_write.write_all(request).await.unwrap();

        let settings = settings();
        let serve = tokio::spawn(async move { serve_connection(proxy_side, &settings).await });

        let mut response = String::new();
        client_read.read_to_string(&mut response).await.unwrap();
        drop(client_write);
        (serve.await.unwrap(), response)
    }

    #[tokio::test]
    async fn malformed_request_gets_400() {
        let (outcome, response) = exchange(b"GET HTTP/1.1\r\n\r\n").await;
        assert!(matches!(outcome, Outcome::BadRequest(ParseError::MissingVersion)));
        assert!(response.starts_with("HTTP/1.0 400 Bad Request\r\n"));
    }

    #[tokio::test]
    async fn unresolved_target_gets_400() {
        let (outcome, response) = exchange(b"GET / HTTP/1.1\r\nAccept: */*\r\n\r\n").await;
        assert!(matches!(outcome, Outcome::BadRequest(ParseError::UnresolvedTarget)));
        assert!(response.starts_with("HTTP/1.0 400 "));
    }

    #[tokio::test]
    async fn refused_target_gets_502() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let request = format!("GET http://127.0.0.1:{}/ HTTP/1.1\r\n\r\n", port);

        let (outcome, response) = exchange(request.as_bytes()).await;
        assert!(matches!(outcome, Outcome::UpstreamFailed { .. }));
        assert_eq!(outcome.label(), "upstream_error");
        assert!(response.starts_with("HTTP/1.0 502 Bad Gateway\r\n"));
    }

    #[tokio::test]
    async fn relays_target_response() {
        let origin = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = origin.local_addr().unwrap().port();
        let origin_task = tokio::spawn(async move {
            let (mut socket, _) = origin.accept().await.unwrap();
            let mut head = Vec::new();
            let mut byte = [0u8; 1];
            while !head.ends_with(b"\r\n\r\n") {
                socket.read_exact(&mut byte).await.unwrap();
                head.push(byte[0]);
            }
            socket.write_all(b"HTTP/1.0 200 OK\r\n\r\nhello").await.unwrap();
            String::from_utf8(head).unwrap()
        });

        let request = format!("GET /greeting HTTP/1.1\r\nHost: 127.0.0.1:{}\r\n\r\n", port);
        let (outcome, response) = exchange(request.as_bytes()).await;

        assert!(matches!(outcome, Outcome::Relayed { bytes: 24, .. }), "got {outcome:?}");
        assert_eq!(response, "HTTP/1.0 200 OK\r\n\r\nhello");

        let forwarded = origin_task.await.unwrap();
        assert!(forwarded.starts_with("GET /greeting HTTP/1.0\r\n"));
        assert!(forwarded.contains("Connection: close\r\n"));
        assert!(forwarded.contains("Proxy-Connection: close\r\n"));
    }

    #[tokio::test]
    async fn bytes_after_head_do_not_abort_the_connection() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let request = format!(
            "POST http://127.0.0.1:{}/ HTTP/1.1\r\nContent-Length: 3\r\n\r\nabc",
            port
        );

        let (outcome, response) = exchange(request.as_bytes()).await;
        assert!(matches!(outcome, Outcome::UpstreamFailed { .. }), "got {outcome:?}");
        assert!(response.starts_with("HTTP/1.0 502 Bad Gateway\r\n"));
    }

    #[tokio::test]
    async fn silent_client_gets_408() {
        let (client, proxy_side) = tokio::io::duplex(1024);
        let mut config = ProxyConfig::default();
        config.timeouts.client_read_secs = 1;
        let settings = ProxySettings::from(&config);

        let (mut client_read, mut client_write) = tokio::io::split(client);
        client_write.write_all(b"GET / HTTP/1.1\r\n").await.unwrap();

        let outcome = serve_connection(proxy_side, &settings).await;
        assert!(matches!(outcome, Outcome::ClientTimeout(_)));

        let mut response = String::new();
        client_read.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.0 408 Request Timeout\r\n"));
    }

    #[tokio::test]
    async fn closed_client_ends_quietly() {
        let (client, proxy_side) = tokio::io::duplex(1024);
        drop(client);
        let outcome = serve_connection(proxy_side, &settings()).await;
        assert!(matches!(outcome, Outcome::ClientClosed));
    }
}
