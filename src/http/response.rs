//! Error responses written to the client.
//!
//! # Responsibilities
//! - Map parse and upstream failures to HTTP status codes
//! - Render a minimal, complete HTTP/1.0 response so the client never hangs
//!
//! # Design Decisions
//! - Always `Connection: close` with an explicit `Content-Length`
//! - Target timeouts return 504 Gateway Timeout, other target failures 502

use tokio::io::{AsyncWrite, AsyncWriteExt};

/// A fixed response the proxy sends on its own behalf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorResponse {
    BadRequest,
    RequestTimeout,
    BadGateway,
    GatewayTimeout,
}

impl ErrorResponse {
    pub fn status(&self) -> u16 {
        match self {
            ErrorResponse::BadRequest => 400,
            ErrorResponse::RequestTimeout => 408,
            ErrorResponse::BadGateway => 502,
            ErrorResponse::GatewayTimeout => 504,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            ErrorResponse::BadRequest => "Bad Request",
            ErrorResponse::RequestTimeout => "Request Timeout",
            ErrorResponse::BadGateway => "Bad Gateway",
            ErrorResponse::GatewayTimeout => "Gateway Timeout",
        }
    }

    /// The full response, head and body.
    pub fn to_bytes(&self) -> Vec<u8> {
        let body = format!("{} {}\n", self.status(), self.reason());
        format!(
            "HTTP/1.0 {} {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            self.status(),
            self.reason(),
            body.len(),
            body
        )
        .into_bytes()
    }

    /// Write the response and flush.
    pub async fn send<W>(&self, client: &mut W) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        client.write_all(&self.to_bytes()).await?;
        client.flush().await
    }
}
